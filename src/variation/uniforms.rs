//! Uniform bundle: normalized config + seed packed into vec4 slots.
//!
//! The bundle is a fixed array of [`Vec4`]s laid out by [`UNIFORM_LAYOUT`].
//! Rebuilding writes into the existing storage component by component and
//! raises an explicit dirty flag when anything changed; the renderer clears it
//! after uploading.

use std::cell::RefCell;
use std::rc::Rc;

use bytemuck::{Pod, Zeroable};

use crate::core::types::Vec4;

use super::config::{
    AntiTilingMode, LayerChannels, MaterialVariationConfig, StairShiftDirection, MAX_MACRO_LAYERS,
};

/// XOR mask for the secondary seed-derived random scalar (32-bit golden ratio).
pub const GOLDEN_RATIO_32: u32 = 0x9E37_79B9;

/// Seed randoms keep the top 24 bits so the f32 result stays below 1.0.
const INV_2_POW_24: f32 = 1.0 / 16_777_216.0;

fn unit_random(bits: u32) -> f32 {
    (bits >> 8) as f32 * INV_2_POW_24
}

/// One named uniform in the block; `len > 1` is a GLSL array.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UniformEntry {
    pub name: &'static str,
    pub len: usize,
}

const fn entry(name: &'static str, len: usize) -> UniformEntry {
    UniformEntry { name, len }
}

/// Declaration order of the block, shared by the packer and the GLSL emitter.
pub const UNIFORM_LAYOUT: &[UniformEntry] = &[
    entry("uMatVarConfig0", 1),
    entry("uMatVarConfig1", 1),
    entry("uMatVarConfig2", 1),
    entry("uMatVarMacroParams", MAX_MACRO_LAYERS),
    entry("uMatVarMacroChannels", MAX_MACRO_LAYERS),
    entry("uMatVarBrick0", 1),
    entry("uMatVarBrickCell", 1),
    entry("uMatVarBrickCellChannels", 1),
    entry("uMatVarMortar", 1),
    entry("uMatVarMortarChannels", 1),
    entry("uMatVarExposure0", 1),
    entry("uMatVarExposure1", 1),
    entry("uMatVarExposureChannels", 1),
    entry("uMatVarStreaks0", 1),
    entry("uMatVarStreaks1", 1),
    entry("uMatVarStreaksChannels", 1),
    entry("uMatVarWearTop", 1),
    entry("uMatVarWearTopChannels", 1),
    entry("uMatVarWearBottom", 1),
    entry("uMatVarWearBottomChannels", 1),
    entry("uMatVarWearSide", 1),
    entry("uMatVarWearSideChannels", 1),
    entry("uMatVarCracks", 1),
    entry("uMatVarCracksChannels", 1),
    entry("uMatVarAntiTiling0", 1),
    entry("uMatVarAntiTiling1", 1),
    entry("uMatVarStairShift0", 1),
    entry("uMatVarStairShift1", 1),
];

/// Total vec4 count of the block.
pub const UNIFORM_VECTOR_COUNT: usize = 34;

// Slot offsets into the vector array, in layout order.
const CONFIG0: usize = 0;
const CONFIG1: usize = 1;
const CONFIG2: usize = 2;
const MACRO_PARAMS: usize = 3;
const MACRO_CHANNELS: usize = MACRO_PARAMS + MAX_MACRO_LAYERS;
const BRICK0: usize = MACRO_CHANNELS + MAX_MACRO_LAYERS;
const BRICK_CELL: usize = BRICK0 + 1;
const BRICK_CELL_CHANNELS: usize = BRICK_CELL + 1;
const MORTAR: usize = BRICK_CELL_CHANNELS + 1;
const MORTAR_CHANNELS: usize = MORTAR + 1;
const EXPOSURE0: usize = MORTAR_CHANNELS + 1;
const EXPOSURE1: usize = EXPOSURE0 + 1;
const EXPOSURE_CHANNELS: usize = EXPOSURE1 + 1;
const STREAKS0: usize = EXPOSURE_CHANNELS + 1;
const STREAKS1: usize = STREAKS0 + 1;
const STREAKS_CHANNELS: usize = STREAKS1 + 1;
const WEAR_TOP: usize = STREAKS_CHANNELS + 1;
const WEAR_TOP_CHANNELS: usize = WEAR_TOP + 1;
const WEAR_BOTTOM: usize = WEAR_TOP_CHANNELS + 1;
const WEAR_BOTTOM_CHANNELS: usize = WEAR_BOTTOM + 1;
const WEAR_SIDE: usize = WEAR_BOTTOM_CHANNELS + 1;
const WEAR_SIDE_CHANNELS: usize = WEAR_SIDE + 1;
const CRACKS: usize = WEAR_SIDE_CHANNELS + 1;
const CRACKS_CHANNELS: usize = CRACKS + 1;
const ANTI_TILING0: usize = CRACKS_CHANNELS + 1;
const ANTI_TILING1: usize = ANTI_TILING0 + 1;
const STAIR_SHIFT0: usize = ANTI_TILING1 + 1;
const STAIR_SHIFT1: usize = STAIR_SHIFT0 + 1;

const _: () = assert!(STAIR_SHIFT1 + 1 == UNIFORM_VECTOR_COUNT);

/// Per-material values that are not part of the config.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UniformInputs {
    pub seed: u32,
    pub seed_offset: f32,
    pub height_min: f32,
    pub height_max: f32,
}

impl Default for UniformInputs {
    fn default() -> Self {
        Self { seed: 0, seed_offset: 0.0, height_min: 0.0, height_max: 1.0 }
    }
}

impl UniformInputs {
    pub fn new(seed: u32) -> Self {
        Self { seed, ..Self::default() }
    }

    pub fn with_heights(mut self, height_min: f32, height_max: f32) -> Self {
        self.height_min = height_min;
        self.height_max = height_max;
        self
    }

    pub fn with_seed_offset(mut self, seed_offset: f32) -> Self {
        self.seed_offset = seed_offset;
        self
    }

    /// Ordered `(lo, hi)` height range; non-finite bounds become 0 and 1.
    pub fn height_range(&self) -> (f32, f32) {
        let a = if self.height_min.is_finite() { self.height_min } else { 0.0 };
        let b = if self.height_max.is_finite() { self.height_max } else { 1.0 };
        (a.min(b), a.max(b))
    }

    fn seed_offset(&self) -> f32 {
        if self.seed_offset.is_finite() { self.seed_offset } else { 0.0 }
    }
}

/// Packed uniform block for one material.
#[derive(Clone, Debug, PartialEq)]
pub struct MaterialVariationUniforms {
    vectors: [Vec4; UNIFORM_VECTOR_COUNT],
    dirty: bool,
}

/// Uniform block shared between a binding and the compiled program.
pub type SharedUniforms = Rc<RefCell<MaterialVariationUniforms>>;

impl MaterialVariationUniforms {
    /// Build a fresh bundle; it starts dirty so the first upload happens.
    pub fn new(config: &MaterialVariationConfig, inputs: &UniformInputs) -> Self {
        Self { vectors: pack(config, inputs), dirty: true }
    }

    /// Recompute in place. Returns whether any component changed.
    pub fn rebuild(&mut self, config: &MaterialVariationConfig, inputs: &UniformInputs) -> bool {
        let fresh = pack(config, inputs);
        self.write_components(&fresh)
    }

    /// Component-wise copy from `other`, keeping this bundle's storage.
    pub fn copy_from(&mut self, other: &MaterialVariationUniforms) -> bool {
        self.write_components(&other.vectors)
    }

    fn write_components(&mut self, src: &[Vec4; UNIFORM_VECTOR_COUNT]) -> bool {
        let mut changed = false;
        for (dst, src) in self.vectors.iter_mut().zip(src) {
            // Bitwise compare so a NaN never reads as "unchanged".
            if dst.to_array().map(f32::to_bits) != src.to_array().map(f32::to_bits) {
                *dst = *src;
                changed = true;
            }
        }
        self.dirty |= changed;
        changed
    }

    pub fn vectors(&self) -> &[Vec4] {
        &self.vectors
    }

    /// The vectors of uniform `name`, or `None` for an unknown name.
    pub fn get(&self, name: &str) -> Option<&[Vec4]> {
        let mut offset = 0;
        for e in UNIFORM_LAYOUT {
            if e.name == name {
                return Some(&self.vectors[offset..offset + e.len]);
            }
            offset += e.len;
        }
        None
    }

    /// `(uniform name, vectors)` pairs in layout order.
    pub fn named_vectors(&self) -> Vec<(&'static str, &[Vec4])> {
        let mut offset = 0;
        UNIFORM_LAYOUT
            .iter()
            .map(|e| {
                let slice = &self.vectors[offset..offset + e.len];
                offset += e.len;
                (e.name, slice)
            })
            .collect()
    }

    pub fn to_gpu(&self) -> GpuMaterialVariation {
        GpuMaterialVariation { vectors: self.vectors.map(|v| v.to_array()) }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    pub fn config0(&self) -> Vec4 {
        self.vectors[CONFIG0]
    }

    pub fn config1(&self) -> Vec4 {
        self.vectors[CONFIG1]
    }

    pub fn config2(&self) -> Vec4 {
        self.vectors[CONFIG2]
    }

    pub fn macro_params(&self, layer: usize) -> Vec4 {
        self.vectors[MACRO_PARAMS + layer.min(MAX_MACRO_LAYERS - 1)]
    }
}

/// Shorthand for `MaterialVariationUniforms::new`.
pub fn build_uniforms(config: &MaterialVariationConfig, inputs: &UniformInputs) -> MaterialVariationUniforms {
    MaterialVariationUniforms::new(config, inputs)
}

/// std140-compatible byte image of the block.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct GpuMaterialVariation {
    pub vectors: [[f32; 4]; UNIFORM_VECTOR_COUNT],
}

fn gated(enabled: bool, amount: f32) -> f32 {
    if enabled { amount } else { 0.0 }
}

fn channel_vec(ch: &LayerChannels) -> Vec4 {
    Vec4::new(ch.value, ch.saturation, ch.roughness, ch.normal)
}

fn band_vec(enabled: bool, intensity: f32, width: f32, scale: f32, ch: &LayerChannels) -> Vec4 {
    Vec4::new(gated(enabled, intensity), width, scale, ch.hue_degrees.to_radians())
}

fn pack(c: &MaterialVariationConfig, inputs: &UniformInputs) -> [Vec4; UNIFORM_VECTOR_COUNT] {
    let mut v = [Vec4::ZERO; UNIFORM_VECTOR_COUNT];
    let seed = inputs.seed;
    let (height_lo, height_hi) = inputs.height_range();

    // The seed is split into 16-bit halves; f32 cannot hold all 32 bits.
    v[CONFIG0] = Vec4::new(
        (seed & 0xFFFF) as f32,
        inputs.seed_offset(),
        c.effective_intensity(),
        c.space.shader_mode(),
    );
    v[CONFIG1] = Vec4::new(height_lo, height_hi, c.world_space_scale, c.object_space_scale);
    v[CONFIG2] = Vec4::new(
        unit_random(seed),
        unit_random(seed ^ GOLDEN_RATIO_32),
        c.ao_amount,
        (seed >> 16) as f32,
    );

    for i in 0..MAX_MACRO_LAYERS {
        let Some(layer) = c.macro_layers.get(i) else { continue };
        v[MACRO_PARAMS + i] = Vec4::new(
            gated(layer.enabled, layer.intensity),
            layer.scale,
            layer.channels.hue_degrees.to_radians(),
            layer.coverage,
        );
        v[MACRO_CHANNELS + i] = channel_vec(&layer.channels);
    }

    let brick = &c.brick;
    v[BRICK0] = Vec4::new(
        brick.bricks_per_tile_x,
        brick.bricks_per_tile_y,
        brick.mortar_width,
        if brick.enabled { 1.0 } else { 0.0 },
    );
    let cell = &brick.per_brick;
    v[BRICK_CELL] = Vec4::new(gated(cell.enabled, cell.intensity), cell.channels.hue_degrees.to_radians(), 0.0, 0.0);
    v[BRICK_CELL_CHANNELS] = channel_vec(&cell.channels);
    let mortar = &brick.mortar;
    v[MORTAR] = Vec4::new(
        gated(mortar.enabled, mortar.intensity),
        mortar.channels.hue_degrees.to_radians(),
        0.0,
        0.0,
    );
    v[MORTAR_CHANNELS] = channel_vec(&mortar.channels);

    let ex = &c.exposure;
    v[EXPOSURE0] = Vec4::new(
        gated(ex.enabled, ex.strength),
        ex.exponent,
        ex.channels.hue_degrees.to_radians(),
        0.0,
    );
    v[EXPOSURE1] = Vec4::new(ex.direction[0], ex.direction[1], ex.direction[2], 0.0);
    v[EXPOSURE_CHANNELS] = channel_vec(&ex.channels);

    let st = &c.streaks;
    v[STREAKS0] = Vec4::new(gated(st.enabled, st.strength), st.scale, st.ledge_strength, st.ledge_scale);
    v[STREAKS1] = Vec4::new(
        st.direction[0],
        st.direction[1],
        st.direction[2],
        st.channels.hue_degrees.to_radians(),
    );
    v[STREAKS_CHANNELS] = channel_vec(&st.channels);

    for (slot, band) in [
        (WEAR_TOP, &c.wear_top),
        (WEAR_BOTTOM, &c.wear_bottom),
        (WEAR_SIDE, &c.wear_side.band),
    ] {
        v[slot] = band_vec(band.enabled, band.intensity, band.width, band.scale, &band.channels);
        v[slot + 1] = channel_vec(&band.channels);
    }

    let cr = &c.cracks_layer;
    v[CRACKS] = Vec4::new(gated(cr.enabled, cr.strength), cr.scale, cr.channels.hue_degrees.to_radians(), 0.0);
    v[CRACKS_CHANNELS] = channel_vec(&cr.channels);

    let at = &c.anti_tiling;
    v[ANTI_TILING0] = Vec4::new(
        gated(at.enabled, at.strength),
        at.cell_size,
        at.blend_width,
        match at.mode {
            AntiTilingMode::Fast => 0.0,
            AntiTilingMode::Quality => 1.0,
        },
    );
    v[ANTI_TILING1] = Vec4::new(at.offset_u, at.offset_v, at.rotation_degrees.to_radians(), 0.0);

    let ss = &c.stair_shift;
    v[STAIR_SHIFT0] = Vec4::new(
        if ss.enabled { 1.0 } else { 0.0 },
        ss.mode.shader_mode(),
        match ss.direction {
            StairShiftDirection::Horizontal => 0.0,
            StairShiftDirection::Vertical => 1.0,
        },
        ss.step_size,
    );
    v[STAIR_SHIFT1] = Vec4::new(ss.shift, ss.blend_width, ss.pattern_a, ss.pattern_b);

    v
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variation::config::VariationRoot;
    use crate::variation::normalize::normalize_material_variation_config;
    use serde_json::json;

    fn wall() -> MaterialVariationConfig {
        normalize_material_variation_config(&json!({}), VariationRoot::Wall)
    }

    #[test]
    fn test_layout_matches_vector_count() {
        let total: usize = UNIFORM_LAYOUT.iter().map(|e| e.len).sum();
        assert_eq!(total, UNIFORM_VECTOR_COUNT);
    }

    #[test]
    fn test_uniform_size_alignment() {
        let size = std::mem::size_of::<GpuMaterialVariation>();
        assert_eq!(size, UNIFORM_VECTOR_COUNT * 16);
        assert_eq!(size % 16, 0, "GpuMaterialVariation size {size} is not 16-byte aligned");
    }

    #[test]
    fn test_bytemuck_cast() {
        let u = build_uniforms(&wall(), &UniformInputs::new(7));
        let gpu = u.to_gpu();
        let bytes = bytemuck::bytes_of(&gpu);
        assert_eq!(bytes.len(), std::mem::size_of::<GpuMaterialVariation>());
        assert_eq!(&bytes[0..4], &7.0f32.to_ne_bytes());
    }

    #[test]
    fn test_height_range_ordered() {
        let u = build_uniforms(&wall(), &UniformInputs::new(1).with_heights(5.0, 1.0));
        assert_eq!(u.config1().x, 1.0);
        assert_eq!(u.config1().y, 5.0);
    }

    #[test]
    fn test_non_finite_heights() {
        let inputs = UniformInputs::new(1).with_heights(f32::NAN, f32::INFINITY);
        assert_eq!(inputs.height_range(), (0.0, 1.0));
    }

    #[test]
    fn test_disabled_packs_zero_intensity() {
        let mut cfg = wall();
        cfg.enabled = false;
        let u = build_uniforms(&cfg, &UniformInputs::new(99));
        assert_eq!(u.config0().z, 0.0);

        let enabled = build_uniforms(&wall(), &UniformInputs::new(99));
        assert_eq!(enabled.config0().z, wall().global_intensity);
    }

    #[test]
    fn test_disabled_layer_has_zero_intensity() {
        let mut cfg = wall();
        cfg.macro_layers[0].enabled = false;
        let u = build_uniforms(&cfg, &UniformInputs::default());
        assert_eq!(u.macro_params(0).x, 0.0);
        assert_eq!(u.macro_params(0).y, cfg.macro_layers[0].scale);
    }

    #[test]
    fn test_degrees_become_radians() {
        let mut cfg = wall();
        cfg.macro_layers[0].channels.hue_degrees = 90.0;
        cfg.anti_tiling.rotation_degrees = 180.0;
        let u = build_uniforms(&cfg, &UniformInputs::default());
        assert!((u.macro_params(0).z - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
        let at1 = u.get("uMatVarAntiTiling1").unwrap()[0];
        assert!((at1.z - std::f32::consts::PI).abs() < 1e-6);
    }

    #[test]
    fn test_seed_packing() {
        let seed = 0xDEAD_BEEFu32;
        let u = build_uniforms(&wall(), &UniformInputs::new(seed).with_seed_offset(3.5));
        assert_eq!(u.config0().x, (seed & 0xFFFF) as f32);
        assert_eq!(u.config0().y, 3.5);
        assert_eq!(u.config2().w, (seed >> 16) as f32);

        let r0 = u.config2().x;
        let r1 = u.config2().y;
        assert!((0.0..1.0).contains(&r0));
        assert!((0.0..1.0).contains(&r1));
        assert!((r0 - (seed as f64 / 4_294_967_296.0) as f32).abs() < 1e-6);
        assert_ne!(r0, r1);
    }

    #[test]
    fn test_seed_randoms_stay_below_one() {
        for seed in [u32::MAX, 0xFFFF_FF80, 0xFFFF_FFFF ^ GOLDEN_RATIO_32, 0] {
            let u = build_uniforms(&wall(), &UniformInputs::new(seed));
            assert!((0.0..1.0).contains(&u.config2().x), "seed {seed:#x}");
            assert!((0.0..1.0).contains(&u.config2().y), "seed {seed:#x}");
        }
    }

    #[test]
    fn test_rebuild_in_place_sets_dirty() {
        let mut cfg = wall();
        let inputs = UniformInputs::new(5);
        let mut u = MaterialVariationUniforms::new(&cfg, &inputs);
        assert!(u.is_dirty());
        u.clear_dirty();

        let before = u.vectors().as_ptr();
        assert!(!u.rebuild(&cfg, &inputs));
        assert!(!u.is_dirty());

        cfg.global_intensity = 2.0;
        assert!(u.rebuild(&cfg, &inputs));
        assert!(u.is_dirty());
        assert_eq!(u.config0().z, 2.0);
        assert_eq!(u.vectors().as_ptr(), before);
    }

    #[test]
    fn test_copy_from() {
        let mut a = build_uniforms(&wall(), &UniformInputs::new(1));
        a.clear_dirty();
        let b = build_uniforms(&wall(), &UniformInputs::new(2));
        assert!(a.copy_from(&b));
        assert!(a.is_dirty());
        assert_eq!(a.vectors(), b.vectors());
    }

    #[test]
    fn test_named_vectors_follow_layout() {
        let u = build_uniforms(&wall(), &UniformInputs::default());
        let named = u.named_vectors();
        assert_eq!(named.len(), UNIFORM_LAYOUT.len());
        assert_eq!(named[0].0, "uMatVarConfig0");
        let macro_params = named.iter().find(|(n, _)| *n == "uMatVarMacroParams").unwrap();
        assert_eq!(macro_params.1.len(), MAX_MACRO_LAYERS);
        assert!(u.get("uMatVarNope").is_none());
    }

    #[test]
    fn test_anti_tiling_and_stair_modes() {
        let cfg = normalize_material_variation_config(
            &json!({
                "antiTiling": { "mode": "quality" },
                "stairShift": { "enabled": true, "mode": "pattern3", "direction": "vertical" }
            }),
            VariationRoot::Wall,
        );
        let u = build_uniforms(&cfg, &UniformInputs::default());
        assert_eq!(u.get("uMatVarAntiTiling0").unwrap()[0].w, 1.0);
        let ss0 = u.get("uMatVarStairShift0").unwrap()[0];
        assert_eq!(ss0.x, 1.0);
        assert_eq!(ss0.y, 3.0);
        assert_eq!(ss0.z, 1.0);
    }
}
