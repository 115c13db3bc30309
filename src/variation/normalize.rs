//! Configuration normalizer.
//!
//! Turns a sparse, loosely-typed JSON config into a fully-populated
//! [`MaterialVariationConfig`]. Every field resolves as explicit value, then
//! root preset, then hardcoded fallback; numbers are coerced (numeric strings,
//! booleans) and clamped to the field's [`Range`]. Non-finite input falls back
//! to the preset value. Nothing here can fail.

use serde_json::{Map, Value};

use super::config::*;
use super::migrate::migrate_v0_to_v1;
use super::presets::preset;

/// Inclusive numeric bounds of one config field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Range {
    pub lo: f32,
    pub hi: f32,
}

impl Range {
    pub const fn new(lo: f32, hi: f32) -> Self {
        Self { lo, hi }
    }

    pub fn clamp(self, v: f32) -> f32 {
        if v.is_nan() { self.lo } else { v.clamp(self.lo, self.hi) }
    }

    fn clamp_f64(self, v: f64) -> f32 {
        v.clamp(self.lo as f64, self.hi as f64) as f32
    }

    pub fn contains(self, v: f32) -> bool {
        v >= self.lo && v <= self.hi
    }
}

/// Declared bounds for every numeric field.
pub mod ranges {
    use super::Range;

    pub const GLOBAL_INTENSITY: Range = Range::new(0.0, 4.0);
    pub const SPACE_SCALE: Range = Range::new(0.001, 100.0);
    pub const UNIT: Range = Range::new(0.0, 1.0);

    pub const INTENSITY: Range = Range::new(0.0, 20.0);
    pub const NOISE_SCALE: Range = Range::new(0.001, 200.0);
    pub const HUE_DEGREES: Range = Range::new(-180.0, 180.0);
    pub const CHANNEL: Range = Range::new(-1.0, 1.0);

    pub const SIDE_WIDTH: Range = Range::new(0.0, 4.0);
    pub const LEDGE_STRENGTH: Range = Range::new(0.0, 4.0);
    pub const LEDGE_SCALE: Range = Range::new(0.0, 64.0);
    pub const EXPONENT: Range = Range::new(0.1, 16.0);
    pub const DIRECTION: Range = Range::new(-1.0, 1.0);

    pub const BRICKS_X: Range = Range::new(1.0, 64.0);
    pub const BRICKS_Y: Range = Range::new(1.0, 128.0);
    pub const MORTAR_WIDTH: Range = Range::new(0.0, 0.5);

    pub const CELL_SIZE: Range = Range::new(0.05, 64.0);
    pub const BLEND_WIDTH: Range = Range::new(0.0, 0.5);
    pub const OFFSET: Range = Range::new(0.0, 1.0);
    pub const ROTATION_DEGREES: Range = Range::new(0.0, 180.0);

    pub const STEP_SIZE: Range = Range::new(0.001, 100.0);
    pub const SHIFT: Range = Range::new(-4.0, 4.0);
    pub const PATTERN: Range = Range::new(-1.0, 1.0);

    pub const LEGACY_STRENGTH: Range = Range::new(0.0, 4.0);
    pub const LEGACY_WIDTH: Range = Range::new(0.0, 4.0);
}

use ranges::*;

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Normalize `input` against the preset for `root`.
///
/// Idempotent: feeding the serialized output back in yields the same config.
pub fn normalize_material_variation_config(input: &Value, root: VariationRoot) -> MaterialVariationConfig {
    let migrated = migrate_v0_to_v1(input);
    normalize_current(&migrated, root)
}

fn normalize_current(input: &Map<String, Value>, root: VariationRoot) -> MaterialVariationConfig {
    let p = preset(root);
    let f = Fields { obj: Some(input) };

    MaterialVariationConfig {
        enabled: f.flag("enabled", p.enabled),
        root,
        space: f.choice(
            "space",
            p.space,
            &[
                ("world", VariationSpace::World),
                ("object", VariationSpace::Object),
                ("local", VariationSpace::Object),
            ],
        ),
        world_space_scale: f.number("worldSpaceScale", p.world_space_scale, SPACE_SCALE),
        object_space_scale: f.number("objectSpaceScale", p.object_space_scale, SPACE_SCALE),
        global_intensity: f.number("globalIntensity", p.global_intensity, GLOBAL_INTENSITY),
        ao_amount: f.number("aoAmount", p.ao_amount, UNIT),

        macro_layers: macro_layers(f.get("macroLayers"), &p.macro_layers),
        brick: brick(f.child("brick"), &p.brick),
        exposure: exposure(f.child("exposure"), &p.exposure),
        streaks: streaks(f.child("streaks"), &p.streaks),
        wear_top: wear(f.child("wearTop"), &p.wear_top, UNIT),
        wear_bottom: wear(f.child("wearBottom"), &p.wear_bottom, UNIT),
        wear_side: WearSideLayer {
            band: wear(f.child("wearSide"), &p.wear_side.band, SIDE_WIDTH),
            use_corner_distance: f
                .child("wearSide")
                .flag("useCornerDistance", p.wear_side.use_corner_distance),
        },
        cracks_layer: cracks(f.child("cracksLayer"), &p.cracks_layer),
        anti_tiling: anti_tiling(f.child("antiTiling"), &p.anti_tiling),
        stair_shift: stair_shift(f.child("stairShift"), &p.stair_shift),

        legacy_macro: simple(f.child("macro"), &p.legacy_macro),
        detail: simple(f.child("detail"), &p.detail),
        grime: simple(f.child("grime"), &p.grime),
        dust: simple(f.child("dust"), &p.dust),
        wetness: simple(f.child("wetness"), &p.wetness),
        sun_bleach: simple(f.child("sunBleach"), &p.sun_bleach),
        moss: simple(f.child("moss"), &p.moss),
        soot: simple(f.child("soot"), &p.soot),
        efflorescence: simple(f.child("efflorescence"), &p.efflorescence),
        edge_wear: simple(f.child("edgeWear"), &p.edge_wear),
        roughness_variation: simple(f.child("roughnessVariation"), &p.roughness_variation),
        cracks: simple(f.child("cracks"), &p.cracks),
    }
}

// ---------------------------------------------------------------------------
// Field access
// ---------------------------------------------------------------------------

/// Read-only view over one JSON object; a missing or non-object value reads
/// as an empty object.
#[derive(Clone, Copy)]
struct Fields<'a> {
    obj: Option<&'a Map<String, Value>>,
}

impl<'a> Fields<'a> {
    fn of(value: Option<&'a Value>) -> Self {
        Self { obj: value.and_then(Value::as_object) }
    }

    fn get(&self, key: &str) -> Option<&'a Value> {
        self.obj?.get(key).filter(|v| !v.is_null())
    }

    fn child(&self, key: &str) -> Fields<'a> {
        Fields::of(self.get(key))
    }

    fn number(&self, key: &str, fallback: f32, range: Range) -> f32 {
        match self.get(key).and_then(coerce_number) {
            Some(v) if v.is_finite() => range.clamp_f64(v),
            Some(v) => {
                log::trace!("non-finite value {v} for `{key}`, using {fallback}");
                range.clamp(fallback)
            }
            None => range.clamp(fallback),
        }
    }

    fn flag(&self, key: &str, fallback: bool) -> bool {
        match self.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
            Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "on" | "yes" | "1" => true,
                "false" | "off" | "no" | "0" => false,
                _ => fallback,
            },
            _ => fallback,
        }
    }

    fn choice<T: Copy>(&self, key: &str, fallback: T, options: &[(&str, T)]) -> T {
        let Some(name) = self.get(key).and_then(Value::as_str) else {
            return fallback;
        };
        let name = name.trim();
        options
            .iter()
            .find(|(label, _)| label.eq_ignore_ascii_case(name))
            .map_or(fallback, |(_, v)| *v)
    }

    /// Unit vector from `[x, y, z]` or `{x, y, z}`; degenerate input falls back.
    fn direction(&self, key: &str, fallback: [f32; 3]) -> [f32; 3] {
        let parsed = match self.get(key) {
            Some(Value::Array(a)) if a.len() >= 3 => {
                [coerce_number(&a[0]), coerce_number(&a[1]), coerce_number(&a[2])]
            }
            Some(Value::Object(o)) => [
                o.get("x").and_then(coerce_number),
                o.get("y").and_then(coerce_number),
                o.get("z").and_then(coerce_number),
            ],
            _ => return fallback,
        };
        let [Some(x), Some(y), Some(z)] = parsed else {
            return fallback;
        };
        let len = (x * x + y * y + z * z).sqrt();
        if !len.is_finite() || len < 1e-6 {
            return fallback;
        }
        // Already-unit input is kept bit-exact so normalization stays idempotent.
        let (x, y, z) = if (len - 1.0).abs() > 1e-6 { (x / len, y / len, z / len) } else { (x, y, z) };
        [DIRECTION.clamp_f64(x), DIRECTION.clamp_f64(y), DIRECTION.clamp_f64(z)]
    }
}

/// `Number(...)`-style coercion: numbers, numeric strings and booleans.
fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() { None } else { s.parse::<f64>().ok() }
        }
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Groups
// ---------------------------------------------------------------------------

fn channels(f: Fields<'_>, fb: &LayerChannels) -> LayerChannels {
    LayerChannels {
        hue_degrees: f.number("hueDegrees", fb.hue_degrees, HUE_DEGREES),
        value: f.number("value", fb.value, CHANNEL),
        saturation: f.number("saturation", fb.saturation, CHANNEL),
        roughness: f.number("roughness", fb.roughness, CHANNEL),
        normal: f.number("normal", fb.normal, CHANNEL),
    }
}

fn macro_layers(value: Option<&Value>, preset_layers: &[MacroLayer]) -> Vec<MacroLayer> {
    let entries = value.and_then(Value::as_array);
    (0..MAX_MACRO_LAYERS)
        .map(|i| {
            let fallback = preset_layers.get(i).copied().unwrap_or(MacroLayer::disabled());
            let f = Fields::of(entries.and_then(|e| e.get(i)));
            MacroLayer {
                enabled: f.flag("enabled", fallback.enabled),
                intensity: f.number("intensity", fallback.intensity, INTENSITY),
                scale: f.number("scale", fallback.scale, NOISE_SCALE),
                coverage: f.number("coverage", fallback.coverage, UNIT),
                channels: channels(f, &fallback.channels),
            }
        })
        .collect()
}

fn wear(f: Fields<'_>, fb: &WearLayer, width: Range) -> WearLayer {
    WearLayer {
        enabled: f.flag("enabled", fb.enabled),
        intensity: f.number("intensity", fb.intensity, INTENSITY),
        width: f.number("width", fb.width, width),
        scale: f.number("scale", fb.scale, NOISE_SCALE),
        channels: channels(f, &fb.channels),
    }
}

fn streaks(f: Fields<'_>, fb: &StreaksLayer) -> StreaksLayer {
    StreaksLayer {
        enabled: f.flag("enabled", fb.enabled),
        strength: f.number("strength", fb.strength, INTENSITY),
        scale: f.number("scale", fb.scale, NOISE_SCALE),
        direction: f.direction("direction", fb.direction),
        ledge_strength: f.number("ledgeStrength", fb.ledge_strength, LEDGE_STRENGTH),
        ledge_scale: f.number("ledgeScale", fb.ledge_scale, LEDGE_SCALE),
        channels: channels(f, &fb.channels),
    }
}

fn exposure(f: Fields<'_>, fb: &ExposureLayer) -> ExposureLayer {
    ExposureLayer {
        enabled: f.flag("enabled", fb.enabled),
        strength: f.number("strength", fb.strength, INTENSITY),
        exponent: f.number("exponent", fb.exponent, EXPONENT),
        direction: f.direction("direction", fb.direction),
        channels: channels(f, &fb.channels),
    }
}

fn brick_channel(f: Fields<'_>, fb: &BrickChannelLayer) -> BrickChannelLayer {
    BrickChannelLayer {
        enabled: f.flag("enabled", fb.enabled),
        intensity: f.number("intensity", fb.intensity, INTENSITY),
        channels: channels(f, &fb.channels),
    }
}

fn brick(f: Fields<'_>, fb: &BrickLayer) -> BrickLayer {
    BrickLayer {
        enabled: f.flag("enabled", fb.enabled),
        bricks_per_tile_x: f.number("bricksPerTileX", fb.bricks_per_tile_x, BRICKS_X),
        bricks_per_tile_y: f.number("bricksPerTileY", fb.bricks_per_tile_y, BRICKS_Y),
        mortar_width: f.number("mortarWidth", fb.mortar_width, MORTAR_WIDTH),
        per_brick: brick_channel(f.child("perBrick"), &fb.per_brick),
        mortar: brick_channel(f.child("mortar"), &fb.mortar),
    }
}

fn cracks(f: Fields<'_>, fb: &CracksLayer) -> CracksLayer {
    CracksLayer {
        enabled: f.flag("enabled", fb.enabled),
        strength: f.number("strength", fb.strength, INTENSITY),
        scale: f.number("scale", fb.scale, NOISE_SCALE),
        channels: channels(f, &fb.channels),
    }
}

fn anti_tiling(f: Fields<'_>, fb: &AntiTilingConfig) -> AntiTilingConfig {
    AntiTilingConfig {
        enabled: f.flag("enabled", fb.enabled),
        mode: f.choice(
            "mode",
            fb.mode,
            &[("fast", AntiTilingMode::Fast), ("quality", AntiTilingMode::Quality)],
        ),
        strength: f.number("strength", fb.strength, UNIT),
        cell_size: f.number("cellSize", fb.cell_size, CELL_SIZE),
        blend_width: f.number("blendWidth", fb.blend_width, BLEND_WIDTH),
        offset_u: f.number("offsetU", fb.offset_u, OFFSET),
        offset_v: f.number("offsetV", fb.offset_v, OFFSET),
        rotation_degrees: f.number("rotationDegrees", fb.rotation_degrees, ROTATION_DEGREES),
    }
}

fn stair_shift(f: Fields<'_>, fb: &StairShiftConfig) -> StairShiftConfig {
    StairShiftConfig {
        enabled: f.flag("enabled", fb.enabled),
        mode: f.choice(
            "mode",
            fb.mode,
            &[
                ("stair", StairShiftMode::Stair),
                ("alternate", StairShiftMode::Alternate),
                ("random", StairShiftMode::Random),
                ("pattern3", StairShiftMode::Pattern3),
            ],
        ),
        direction: f.choice(
            "direction",
            fb.direction,
            &[
                ("horizontal", StairShiftDirection::Horizontal),
                ("vertical", StairShiftDirection::Vertical),
            ],
        ),
        step_size: f.number("stepSize", fb.step_size, STEP_SIZE),
        shift: f.number("shift", fb.shift, SHIFT),
        blend_width: f.number("blendWidth", fb.blend_width, BLEND_WIDTH),
        pattern_a: f.number("patternA", fb.pattern_a, PATTERN),
        pattern_b: f.number("patternB", fb.pattern_b, PATTERN),
    }
}

fn simple(f: Fields<'_>, fb: &SimpleEffect) -> SimpleEffect {
    SimpleEffect {
        enabled: f.flag("enabled", fb.enabled),
        strength: f.number("strength", fb.strength, LEGACY_STRENGTH),
        scale: f.number("scale", fb.scale, NOISE_SCALE),
        width: f.number("width", fb.width, LEGACY_WIDTH),
    }
}

// ---------------------------------------------------------------------------
// Field inventory
// ---------------------------------------------------------------------------

/// One numeric field of a normalized config, addressed by JSON pointer.
#[derive(Clone, Debug, PartialEq)]
pub struct NumericField {
    pub path: String,
    pub value: f32,
    pub range: Range,
}

/// Every numeric field of `config` with its declared range.
pub fn numeric_fields(config: &MaterialVariationConfig) -> Vec<NumericField> {
    let mut out = Inventory(Vec::with_capacity(256));
    let c = config;

    out.push("/worldSpaceScale", c.world_space_scale, SPACE_SCALE);
    out.push("/objectSpaceScale", c.object_space_scale, SPACE_SCALE);
    out.push("/globalIntensity", c.global_intensity, GLOBAL_INTENSITY);
    out.push("/aoAmount", c.ao_amount, UNIT);

    for (i, layer) in c.macro_layers.iter().enumerate() {
        let base = format!("/macroLayers/{i}");
        out.push(&format!("{base}/intensity"), layer.intensity, INTENSITY);
        out.push(&format!("{base}/scale"), layer.scale, NOISE_SCALE);
        out.push(&format!("{base}/coverage"), layer.coverage, UNIT);
        out.channels(&base, &layer.channels);
    }

    out.push("/brick/bricksPerTileX", c.brick.bricks_per_tile_x, BRICKS_X);
    out.push("/brick/bricksPerTileY", c.brick.bricks_per_tile_y, BRICKS_Y);
    out.push("/brick/mortarWidth", c.brick.mortar_width, MORTAR_WIDTH);
    for (name, layer) in [("perBrick", &c.brick.per_brick), ("mortar", &c.brick.mortar)] {
        let base = format!("/brick/{name}");
        out.push(&format!("{base}/intensity"), layer.intensity, INTENSITY);
        out.channels(&base, &layer.channels);
    }

    out.push("/exposure/strength", c.exposure.strength, INTENSITY);
    out.push("/exposure/exponent", c.exposure.exponent, EXPONENT);
    out.direction("/exposure/direction", c.exposure.direction);
    out.channels("/exposure", &c.exposure.channels);

    out.push("/streaks/strength", c.streaks.strength, INTENSITY);
    out.push("/streaks/scale", c.streaks.scale, NOISE_SCALE);
    out.push("/streaks/ledgeStrength", c.streaks.ledge_strength, LEDGE_STRENGTH);
    out.push("/streaks/ledgeScale", c.streaks.ledge_scale, LEDGE_SCALE);
    out.direction("/streaks/direction", c.streaks.direction);
    out.channels("/streaks", &c.streaks.channels);

    for (name, band, width) in [
        ("wearTop", &c.wear_top, UNIT),
        ("wearBottom", &c.wear_bottom, UNIT),
        ("wearSide", &c.wear_side.band, SIDE_WIDTH),
    ] {
        let base = format!("/{name}");
        out.push(&format!("{base}/intensity"), band.intensity, INTENSITY);
        out.push(&format!("{base}/width"), band.width, width);
        out.push(&format!("{base}/scale"), band.scale, NOISE_SCALE);
        out.channels(&base, &band.channels);
    }

    out.push("/cracksLayer/strength", c.cracks_layer.strength, INTENSITY);
    out.push("/cracksLayer/scale", c.cracks_layer.scale, NOISE_SCALE);
    out.channels("/cracksLayer", &c.cracks_layer.channels);

    let at = &c.anti_tiling;
    out.push("/antiTiling/strength", at.strength, UNIT);
    out.push("/antiTiling/cellSize", at.cell_size, CELL_SIZE);
    out.push("/antiTiling/blendWidth", at.blend_width, BLEND_WIDTH);
    out.push("/antiTiling/offsetU", at.offset_u, OFFSET);
    out.push("/antiTiling/offsetV", at.offset_v, OFFSET);
    out.push("/antiTiling/rotationDegrees", at.rotation_degrees, ROTATION_DEGREES);

    let ss = &c.stair_shift;
    out.push("/stairShift/stepSize", ss.step_size, STEP_SIZE);
    out.push("/stairShift/shift", ss.shift, SHIFT);
    out.push("/stairShift/blendWidth", ss.blend_width, BLEND_WIDTH);
    out.push("/stairShift/patternA", ss.pattern_a, PATTERN);
    out.push("/stairShift/patternB", ss.pattern_b, PATTERN);

    for (name, effect) in [
        ("macro", &c.legacy_macro),
        ("detail", &c.detail),
        ("grime", &c.grime),
        ("dust", &c.dust),
        ("wetness", &c.wetness),
        ("sunBleach", &c.sun_bleach),
        ("moss", &c.moss),
        ("soot", &c.soot),
        ("efflorescence", &c.efflorescence),
        ("edgeWear", &c.edge_wear),
        ("roughnessVariation", &c.roughness_variation),
        ("cracks", &c.cracks),
    ] {
        out.push(&format!("/{name}/strength"), effect.strength, LEGACY_STRENGTH);
        out.push(&format!("/{name}/scale"), effect.scale, NOISE_SCALE);
        out.push(&format!("/{name}/width"), effect.width, LEGACY_WIDTH);
    }

    out.0
}

struct Inventory(Vec<NumericField>);

impl Inventory {
    fn push(&mut self, path: &str, value: f32, range: Range) {
        self.0.push(NumericField { path: path.to_string(), value, range });
    }

    fn channels(&mut self, base: &str, ch: &LayerChannels) {
        self.push(&format!("{base}/hueDegrees"), ch.hue_degrees, HUE_DEGREES);
        self.push(&format!("{base}/value"), ch.value, CHANNEL);
        self.push(&format!("{base}/saturation"), ch.saturation, CHANNEL);
        self.push(&format!("{base}/roughness"), ch.roughness, CHANNEL);
        self.push(&format!("{base}/normal"), ch.normal, CHANNEL);
    }

    fn direction(&mut self, base: &str, d: [f32; 3]) {
        for (i, v) in d.iter().enumerate() {
            self.push(&format!("{base}/{i}"), *v, DIRECTION);
        }
    }
}
