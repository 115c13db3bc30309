//! Normalized material variation configuration.
//!
//! These types describe the canonical, fully-populated shape produced by
//! [`super::normalize::normalize_material_variation_config`]. Field names
//! serialize in camelCase so a normalized config round-trips through the same
//! JSON schema it was read from.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Number of macro noise layers carried by every normalized config.
pub const MAX_MACRO_LAYERS: usize = 4;

/// Index of the macro layer whose `coverage` field is meaningful.
pub const COVERAGE_LAYER: usize = 2;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which default preset a material starts from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariationRoot {
    /// Vertical facades: stronger wear and streaks.
    #[default]
    Wall,
    /// Roofs and ground-like horizontal surfaces.
    Surface,
}

/// Coordinate space the procedural noise is evaluated in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariationSpace {
    #[default]
    World,
    Object,
}

impl VariationSpace {
    /// Value packed into the uniform block.
    pub fn shader_mode(self) -> f32 {
        match self {
            Self::World => 0.0,
            Self::Object => 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AntiTilingMode {
    #[default]
    Fast,
    /// Adds a low-frequency domain warp on top of the per-cell transform.
    Quality,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StairShiftMode {
    /// Offset grows linearly with the step index.
    #[default]
    Stair,
    /// Even steps unshifted, odd steps shifted.
    Alternate,
    /// Per-step pseudo-random offset.
    Random,
    /// Repeating `0, patternA, patternB`.
    Pattern3,
}

impl StairShiftMode {
    pub fn shader_mode(self) -> f32 {
        match self {
            Self::Stair => 0.0,
            Self::Alternate => 1.0,
            Self::Random => 2.0,
            Self::Pattern3 => 3.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StairShiftDirection {
    /// Rows are shifted along U.
    #[default]
    Horizontal,
    /// Columns are shifted along V.
    Vertical,
}

// ---------------------------------------------------------------------------
// Layer building blocks
// ---------------------------------------------------------------------------

/// Per-layer color/roughness/normal contribution.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerChannels {
    pub hue_degrees: f32,
    /// Brightness multiplier delta.
    pub value: f32,
    pub saturation: f32,
    pub roughness: f32,
    /// Normal-map strength delta.
    pub normal: f32,
}

impl LayerChannels {
    pub const fn new(hue_degrees: f32, value: f32, saturation: f32, roughness: f32, normal: f32) -> Self {
        Self { hue_degrees, value, saturation, roughness, normal }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MacroLayer {
    pub enabled: bool,
    pub intensity: f32,
    pub scale: f32,
    /// Fraction of the surface covered; only read for layer [`COVERAGE_LAYER`].
    pub coverage: f32,
    #[serde(flatten)]
    pub channels: LayerChannels,
}

impl MacroLayer {
    /// Hardcoded fallback for layers the preset does not define.
    pub const fn disabled() -> Self {
        Self {
            enabled: false,
            intensity: 0.0,
            scale: 1.0,
            coverage: 0.0,
            channels: LayerChannels::new(0.0, 0.0, 0.0, 0.0, 0.0),
        }
    }
}

/// Height- or edge-driven weathering band.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WearLayer {
    pub enabled: bool,
    pub intensity: f32,
    /// Band extent: 0..1 of the height range for top/bottom, 0..4 meters for side.
    pub width: f32,
    /// Breakup noise frequency.
    pub scale: f32,
    #[serde(flatten)]
    pub channels: LayerChannels,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WearSideLayer {
    #[serde(flatten)]
    pub band: WearLayer,
    /// Scale the wear by the per-vertex distance to the nearest footprint corner.
    pub use_corner_distance: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreaksLayer {
    pub enabled: bool,
    pub strength: f32,
    pub scale: f32,
    /// Unit run direction (gravity by default).
    pub direction: [f32; 3],
    pub ledge_strength: f32,
    pub ledge_scale: f32,
    #[serde(flatten)]
    pub channels: LayerChannels,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExposureLayer {
    pub enabled: bool,
    pub strength: f32,
    pub exponent: f32,
    /// Unit direction toward the dominant sun.
    pub direction: [f32; 3],
    #[serde(flatten)]
    pub channels: LayerChannels,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrickChannelLayer {
    pub enabled: bool,
    pub intensity: f32,
    #[serde(flatten)]
    pub channels: LayerChannels,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrickLayer {
    pub enabled: bool,
    pub bricks_per_tile_x: f32,
    pub bricks_per_tile_y: f32,
    /// Mortar joint width as a fraction of one brick cell.
    pub mortar_width: f32,
    pub per_brick: BrickChannelLayer,
    pub mortar: BrickChannelLayer,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CracksLayer {
    pub enabled: bool,
    pub strength: f32,
    pub scale: f32,
    #[serde(flatten)]
    pub channels: LayerChannels,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AntiTilingConfig {
    pub enabled: bool,
    pub mode: AntiTilingMode,
    pub strength: f32,
    /// Cell size in texture-tile units.
    pub cell_size: f32,
    /// Half-width of the soft band around cell borders, in cell units.
    pub blend_width: f32,
    pub offset_u: f32,
    pub offset_v: f32,
    pub rotation_degrees: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StairShiftConfig {
    pub enabled: bool,
    pub mode: StairShiftMode,
    pub direction: StairShiftDirection,
    pub step_size: f32,
    pub shift: f32,
    pub blend_width: f32,
    pub pattern_a: f32,
    pub pattern_b: f32,
}

/// Shape shared by the legacy single-purpose effect groups.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleEffect {
    pub enabled: bool,
    pub strength: f32,
    pub scale: f32,
    pub width: f32,
}

impl SimpleEffect {
    pub const fn new(enabled: bool, strength: f32, scale: f32, width: f32) -> Self {
        Self { enabled, strength, scale, width }
    }
}

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Fully-populated, range-safe variation config bound to one material.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialVariationConfig {
    pub enabled: bool,
    pub root: VariationRoot,
    pub space: VariationSpace,
    pub world_space_scale: f32,
    pub object_space_scale: f32,
    pub global_intensity: f32,
    /// Blend of the roughness-map cavity term, 0..1.
    pub ao_amount: f32,

    pub macro_layers: Vec<MacroLayer>,
    pub brick: BrickLayer,
    pub exposure: ExposureLayer,
    pub streaks: StreaksLayer,
    pub wear_top: WearLayer,
    pub wear_bottom: WearLayer,
    pub wear_side: WearSideLayer,
    pub cracks_layer: CracksLayer,
    pub anti_tiling: AntiTilingConfig,
    pub stair_shift: StairShiftConfig,

    // -- Legacy groups, kept for persistence and migration -----------------
    #[serde(rename = "macro")]
    pub legacy_macro: SimpleEffect,
    pub detail: SimpleEffect,
    pub grime: SimpleEffect,
    pub dust: SimpleEffect,
    pub wetness: SimpleEffect,
    pub sun_bleach: SimpleEffect,
    pub moss: SimpleEffect,
    pub soot: SimpleEffect,
    pub efflorescence: SimpleEffect,
    pub edge_wear: SimpleEffect,
    pub roughness_variation: SimpleEffect,
    pub cracks: SimpleEffect,
}

impl MaterialVariationConfig {
    /// Whether the mesh builder must supply the `matVarCornerDist` attribute.
    pub fn uses_corner_distance(&self) -> bool {
        let side = &self.wear_side;
        self.enabled
            && self.global_intensity > 0.0
            && side.band.enabled
            && side.band.intensity > 0.0
            && side.use_corner_distance
    }

    /// `globalIntensity` when enabled, else zero.
    pub fn effective_intensity(&self) -> f32 {
        if self.enabled { self.global_intensity } else { 0.0 }
    }

    /// Serialize to the JSON schema accepted by the normalizer.
    pub fn to_value(&self) -> Value {
        // Every field is a finite number, bool, enum or nested struct.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Read a sparse variation config from a JSON file.
pub fn load_config_file(path: impl AsRef<Path>) -> crate::core::Result<Value> {
    let text = std::fs::read_to_string(path.as_ref())?;
    let value = serde_json::from_str(&text)?;
    Ok(value)
}
