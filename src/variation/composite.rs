//! CPU reference for the fragment compositing primitive.
//!
//! [`SurfaceSample::apply_layer`] follows `mvApplyLayer` in the injected GLSL
//! line for line, so tools can preview a stack of layers and tests can check
//! shader-side properties without a GPU.

use crate::core::types::{Mat3, Vec3, Vec4};

/// Below this combined magnitude a layer contribution is skipped.
pub const APPLY_EPSILON: f32 = 1e-5;

pub const LUMINANCE: Vec3 = Vec3::new(0.2126, 0.7152, 0.0722);

const RGB_TO_YIQ: Mat3 = Mat3::from_cols(
    Vec3::new(0.299, 0.595_716, 0.211_456),
    Vec3::new(0.587, -0.274_453, -0.522_591),
    Vec3::new(0.114, -0.321_263, 0.311_135),
);

const YIQ_TO_RGB: Mat3 = Mat3::from_cols(
    Vec3::new(1.0, 1.0, 1.0),
    Vec3::new(0.9563, -0.2721, -1.1070),
    Vec3::new(0.6210, -0.6474, 1.7046),
);

/// Rotate the chroma of `color` by `angle` radians in YIQ space.
pub fn hue_rotate(color: Vec3, angle: f32) -> Vec3 {
    let yiq = RGB_TO_YIQ * color;
    let (s, c) = angle.sin_cos();
    let i = yiq.y * c - yiq.z * s;
    let q = yiq.y * s + yiq.z * c;
    YIQ_TO_RGB * Vec3::new(yiq.x, i, q)
}

/// Lerp toward luminance for `amount < 1`, away from it for `amount > 1`.
pub fn adjust_saturation(color: Vec3, amount: f32) -> Vec3 {
    let luma = Vec3::splat(color.dot(LUMINANCE));
    luma.lerp(color, amount)
}

/// Shading values of one fragment as the compositor sees them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceSample {
    pub color: Vec3,
    pub roughness: f32,
    /// Multiplier on the normal-map strength.
    pub normal_factor: f32,
    /// Set once any layer contributed.
    pub has_effect: bool,
}

impl SurfaceSample {
    pub fn new(color: Vec3, roughness: f32) -> Self {
        Self { color, roughness, normal_factor: 1.0, has_effect: false }
    }

    /// Apply one layer with `mask` weighting `channels = (value, saturation,
    /// roughness, normal)` and `hue` radians.
    pub fn apply_layer(&mut self, mask: f32, channels: Vec4, hue: f32) {
        let weighted = channels * mask;
        let hue = hue * mask;
        if weighted.abs().element_sum() + hue.abs() <= APPLY_EPSILON {
            return;
        }
        self.has_effect = true;

        self.color *= (1.0 + weighted.x).max(0.0);
        self.color = adjust_saturation(self.color, (1.0 + weighted.y).max(0.0));
        if hue.abs() > APPLY_EPSILON {
            self.color = hue_rotate(self.color, hue);
        }
        self.roughness += weighted.z;
        self.normal_factor += weighted.w;
    }

    /// Final clamp; untouched samples keep their base values exactly.
    pub fn finish(mut self) -> Self {
        if self.has_effect {
            self.color = self.color.clamp(Vec3::ZERO, Vec3::splat(2.0));
            self.roughness = self.roughness.clamp(0.03, 1.0);
            self.normal_factor = self.normal_factor.clamp(0.0, 2.0);
        }
        self
    }
}
