//! Fragment effect stages in evaluation order.
//!
//! Each stage is a data row: a GLSL gate, a mask expression and the uniforms
//! feeding `mvApplyLayer`. The composite block is generated by walking
//! [`EFFECT_STAGES`] front to back, so reordering stages is a table edit.

use std::fmt::Write;

/// One compositing step of the fragment shader.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EffectStage {
    pub name: &'static str,
    /// GLSL bool expression; the stage is skipped when false.
    pub enabled: &'static str,
    /// GLSL float expression for the mask, evaluated only when enabled.
    pub mask: &'static str,
    /// GLSL float expression scaling the mask.
    pub intensity: &'static str,
    /// GLSL vec4 `(value, saturation, roughness, normal)`.
    pub channels: &'static str,
    /// GLSL float hue rotation in radians.
    pub hue: &'static str,
}

pub const EFFECT_STAGES: &[EffectStage] = &[
    EffectStage {
        name: "cavity",
        enabled: "uMatVarConfig2.z > 0.0",
        mask: "mvCavity",
        intensity: "uMatVarConfig2.z",
        channels: "vec4( -0.35, -0.15, 0.12, 0.0 )",
        hue: "0.0",
    },
    EffectStage {
        name: "macro0",
        enabled: "uMatVarMacroParams[ 0 ].x > 0.0",
        mask: "mvFbm( mvUv * uMatVarMacroParams[ 0 ].y + mvSeedVector( 0.0 ) ) * 2.0 - 1.0",
        intensity: "uMatVarMacroParams[ 0 ].x",
        channels: "uMatVarMacroChannels[ 0 ]",
        hue: "uMatVarMacroParams[ 0 ].z",
    },
    EffectStage {
        name: "macro1",
        enabled: "uMatVarMacroParams[ 1 ].x > 0.0",
        mask: "mvFbm( mvUv * uMatVarMacroParams[ 1 ].y + mvSeedVector( 1.0 ) ) * 2.0 - 1.0",
        intensity: "uMatVarMacroParams[ 1 ].x",
        channels: "uMatVarMacroChannels[ 1 ]",
        hue: "uMatVarMacroParams[ 1 ].z",
    },
    // Patch layer: only the top `coverage` fraction of the noise range fires.
    EffectStage {
        name: "macro2",
        enabled: "uMatVarMacroParams[ 2 ].x > 0.0 && uMatVarMacroParams[ 2 ].w > 0.0",
        mask: "smoothstep( 1.0 - uMatVarMacroParams[ 2 ].w, 1.0 - uMatVarMacroParams[ 2 ].w + 0.15, mvFbm( mvUv * uMatVarMacroParams[ 2 ].y + mvSeedVector( 2.0 ) ) )",
        intensity: "uMatVarMacroParams[ 2 ].x",
        channels: "uMatVarMacroChannels[ 2 ]",
        hue: "uMatVarMacroParams[ 2 ].z",
    },
    EffectStage {
        name: "macro3",
        enabled: "uMatVarMacroParams[ 3 ].x > 0.0",
        mask: "mvFbm( mvUv * uMatVarMacroParams[ 3 ].y + mvSeedVector( 3.0 ) ) * 2.0 - 1.0",
        intensity: "uMatVarMacroParams[ 3 ].x",
        channels: "uMatVarMacroChannels[ 3 ]",
        hue: "uMatVarMacroParams[ 3 ].z",
    },
    EffectStage {
        name: "brick",
        enabled: "uMatVarBrick0.w > 0.5 && uMatVarBrickCell.x > 0.0",
        mask: "( mvBrick.y * 2.0 - 1.0 ) * ( 1.0 - mvBrick.x )",
        intensity: "uMatVarBrickCell.x",
        channels: "uMatVarBrickCellChannels",
        hue: "uMatVarBrickCell.y",
    },
    EffectStage {
        name: "mortar",
        enabled: "uMatVarBrick0.w > 0.5 && uMatVarMortar.x > 0.0",
        mask: "mvBrick.x",
        intensity: "uMatVarMortar.x",
        channels: "uMatVarMortarChannels",
        hue: "uMatVarMortar.y",
    },
    EffectStage {
        name: "exposure",
        enabled: "uMatVarExposure0.x > 0.0",
        mask: "pow( clamp( dot( mvNrmW, uMatVarExposure1.xyz ), 0.0, 1.0 ), uMatVarExposure0.y )",
        intensity: "uMatVarExposure0.x",
        channels: "uMatVarExposureChannels",
        hue: "uMatVarExposure0.z",
    },
    EffectStage {
        name: "streaks",
        enabled: "uMatVarStreaks0.x > 0.0",
        mask: "mvStreakMask( mvUv, mvNrmW )",
        intensity: "uMatVarStreaks0.x",
        channels: "uMatVarStreaksChannels",
        hue: "uMatVarStreaks1.w",
    },
    EffectStage {
        name: "wear_top",
        enabled: "uMatVarWearTop.x > 0.0",
        mask: "mvBandMask( mvUv, 1.0 - mvHeight, uMatVarWearTop.y, uMatVarWearTop.z, 11.0 )",
        intensity: "uMatVarWearTop.x",
        channels: "uMatVarWearTopChannels",
        hue: "uMatVarWearTop.w",
    },
    EffectStage {
        name: "wear_bottom",
        enabled: "uMatVarWearBottom.x > 0.0",
        mask: "mvBandMask( mvUv, mvHeight, uMatVarWearBottom.y, uMatVarWearBottom.z, 13.0 )",
        intensity: "uMatVarWearBottom.x",
        channels: "uMatVarWearBottomChannels",
        hue: "uMatVarWearBottom.w",
    },
    EffectStage {
        name: "wear_side",
        enabled: "uMatVarWearSide.x > 0.0",
        mask: "mvBandMask( mvUv, mvSideDistance( mvUv ), uMatVarWearSide.y, uMatVarWearSide.z, 15.0 )",
        intensity: "uMatVarWearSide.x",
        channels: "uMatVarWearSideChannels",
        hue: "uMatVarWearSide.w",
    },
    EffectStage {
        name: "cracks",
        enabled: "uMatVarCracks.x > 0.0",
        mask: "smoothstep( 0.72, 0.95, mvRidgedFbm( mvUv * uMatVarCracks.y + mvSeedVector( 17.0 ) ) )",
        intensity: "uMatVarCracks.x",
        channels: "uMatVarCracksChannels",
        hue: "uMatVarCracks.z",
    },
];

impl EffectStage {
    /// GLSL for this stage inside the composite block.
    pub fn emit(&self, out: &mut String) {
        // Writing into a String cannot fail.
        let _ = write!(
            out,
            "\t// {name}\n\
             \tif ( {enabled} ) {{\n\
             \t\tfloat mvMask = {mask};\n\
             \t\tmvApplyLayer( mvMask * {intensity} * mvIntensity, {channels}, {hue}, mvColor, mvRoughness, mvNormalFactor, mvHasEffect );\n\
             \t}}\n",
            name = self.name,
            enabled = self.enabled,
            mask = self.mask,
            intensity = self.intensity,
            channels = self.channels,
            hue = self.hue,
        );
    }
}

/// Stage bodies for every entry of `stages`, in order.
pub fn emit_stages(stages: &[EffectStage]) -> String {
    let mut out = String::with_capacity(stages.len() * 256);
    for stage in stages {
        stage.emit(&mut out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order() {
        let names: Vec<&str> = EFFECT_STAGES.iter().map(|s| s.name).collect();
        assert_eq!(
            names,
            [
                "cavity", "macro0", "macro1", "macro2", "macro3", "brick", "mortar", "exposure", "streaks",
                "wear_top", "wear_bottom", "wear_side", "cracks",
            ]
        );
    }

    #[test]
    fn test_stage_names_unique() {
        let mut names: Vec<&str> = EFFECT_STAGES.iter().map(|s| s.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), EFFECT_STAGES.len());
    }

    #[test]
    fn test_emitted_order_follows_table() {
        let glsl = emit_stages(EFFECT_STAGES);
        let mut last = 0;
        for stage in EFFECT_STAGES {
            let at = glsl.find(&format!("// {}\n", stage.name)).unwrap();
            assert!(at >= last, "{} emitted out of order", stage.name);
            last = at;
        }
        assert_eq!(glsl.matches("mvApplyLayer(").count(), EFFECT_STAGES.len());
    }

    #[test]
    fn test_every_stage_scaled_by_global_intensity() {
        let mut out = String::new();
        for stage in EFFECT_STAGES {
            out.clear();
            stage.emit(&mut out);
            assert!(out.contains("* mvIntensity"), "{} not gated", stage.name);
        }
    }
}
