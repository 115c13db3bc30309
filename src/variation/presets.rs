//! Root-specific default presets.
//!
//! WALL is tuned for vertical facades (visible wear bands, streaking, cracks,
//! anti-tiling on by default). SURFACE is gentler and tuned for roofs and
//! ground-like materials. Both are built once and read-only afterwards.
//!
//! The new-style groups in each preset agree with what migrating the preset's
//! own legacy groups would produce, so a config that only carries legacy
//! fields lands in the same place as one that carries neither.

use std::sync::LazyLock;

use super::config::*;

static WALL: LazyLock<MaterialVariationConfig> = LazyLock::new(wall_preset);
static SURFACE: LazyLock<MaterialVariationConfig> = LazyLock::new(surface_preset);

/// Default preset for `root`.
pub fn preset(root: VariationRoot) -> &'static MaterialVariationConfig {
    match root {
        VariationRoot::Wall => &WALL,
        VariationRoot::Surface => &SURFACE,
    }
}

fn wall_preset() -> MaterialVariationConfig {
    MaterialVariationConfig {
        enabled: true,
        root: VariationRoot::Wall,
        space: VariationSpace::World,
        world_space_scale: 0.25,
        object_space_scale: 1.0,
        global_intensity: 1.0,
        ao_amount: 0.5,

        // Layers beyond the preset's list fall back to `MacroLayer::disabled`.
        macro_layers: vec![
            // 0: broad tonal blotches
            MacroLayer {
                enabled: true,
                intensity: 0.8,
                scale: 0.35,
                coverage: 0.0,
                channels: LayerChannels::new(4.0, 0.12, -0.06, 0.08, 0.0),
            },
            // 1: fine detail grain
            MacroLayer {
                enabled: true,
                intensity: 0.45,
                scale: 3.2,
                coverage: 0.0,
                channels: LayerChannels::new(0.0, 0.06, 0.0, 0.12, 0.18),
            },
            // 2: patchy organic growth
            MacroLayer {
                enabled: true,
                intensity: 0.6,
                scale: 0.9,
                coverage: 0.25,
                channels: LayerChannels::new(28.0, -0.18, 0.12, 0.1, 0.1),
            },
        ],

        brick: BrickLayer {
            enabled: false,
            bricks_per_tile_x: 4.0,
            bricks_per_tile_y: 8.0,
            mortar_width: 0.06,
            per_brick: BrickChannelLayer {
                enabled: true,
                intensity: 0.5,
                channels: LayerChannels::new(3.0, 0.1, 0.08, 0.05, 0.0),
            },
            mortar: BrickChannelLayer {
                enabled: true,
                intensity: 0.6,
                channels: LayerChannels::new(0.0, -0.2, -0.25, 0.15, 0.2),
            },
        },

        exposure: ExposureLayer {
            enabled: true,
            strength: 0.35,
            exponent: 2.0,
            direction: normalized([0.4, 0.85, 0.35]),
            channels: LayerChannels::new(-6.0, 0.14, -0.22, 0.06, 0.0),
        },

        streaks: StreaksLayer {
            enabled: true,
            strength: 0.55,
            scale: 0.6,
            direction: [0.0, -1.0, 0.0],
            ledge_strength: 0.4,
            ledge_scale: 3.0,
            channels: LayerChannels::new(0.0, -0.28, -0.08, 0.12, 0.05),
        },

        wear_top: WearLayer {
            enabled: true,
            intensity: 0.35,
            width: 0.25,
            scale: 1.4,
            channels: LayerChannels::new(0.0, 0.12, -0.15, 0.15, -0.1),
        },
        wear_bottom: WearLayer {
            enabled: true,
            intensity: 0.6,
            width: 0.3,
            scale: 1.1,
            channels: LayerChannels::new(8.0, -0.3, 0.05, 0.18, 0.1),
        },
        wear_side: WearSideLayer {
            band: WearLayer {
                enabled: true,
                intensity: 0.4,
                width: 0.8,
                scale: 2.2,
                channels: LayerChannels::new(0.0, 0.16, -0.1, -0.1, 0.25),
            },
            use_corner_distance: false,
        },

        cracks_layer: CracksLayer {
            enabled: true,
            strength: 0.3,
            scale: 1.8,
            channels: LayerChannels::new(0.0, -0.35, 0.0, 0.2, 0.45),
        },

        anti_tiling: AntiTilingConfig {
            enabled: true,
            mode: AntiTilingMode::Fast,
            strength: 0.6,
            cell_size: 2.0,
            blend_width: 0.2,
            offset_u: 0.5,
            offset_v: 0.5,
            rotation_degrees: 25.0,
        },

        stair_shift: StairShiftConfig {
            enabled: false,
            mode: StairShiftMode::Stair,
            direction: StairShiftDirection::Horizontal,
            step_size: 1.0,
            shift: 0.25,
            blend_width: 0.0,
            pattern_a: 0.33,
            pattern_b: 0.66,
        },

        legacy_macro: SimpleEffect::new(true, 0.8, 0.35, 0.0),
        detail: SimpleEffect::new(true, 0.45, 3.2, 0.0),
        grime: SimpleEffect::new(true, 0.6, 1.1, 0.3),
        dust: SimpleEffect::new(true, 0.35, 1.4, 0.25),
        wetness: SimpleEffect::new(false, 0.0, 1.0, 0.2),
        sun_bleach: SimpleEffect::new(true, 0.35, 1.0, 0.0),
        moss: SimpleEffect::new(false, 0.0, 0.9, 0.0),
        soot: SimpleEffect::new(true, 0.55, 0.6, 0.0),
        efflorescence: SimpleEffect::new(false, 0.0, 1.5, 0.15),
        edge_wear: SimpleEffect::new(true, 0.4, 2.2, 0.8),
        roughness_variation: SimpleEffect::new(true, 0.2, 2.0, 0.0),
        cracks: SimpleEffect::new(true, 0.3, 1.8, 0.0),
    }
}

fn surface_preset() -> MaterialVariationConfig {
    let wall = wall_preset();
    MaterialVariationConfig {
        root: VariationRoot::Surface,
        world_space_scale: 0.2,
        ao_amount: 0.35,

        macro_layers: vec![
            MacroLayer {
                enabled: true,
                intensity: 0.6,
                scale: 0.25,
                coverage: 0.0,
                channels: LayerChannels::new(3.0, 0.1, -0.05, 0.1, 0.0),
            },
            MacroLayer {
                enabled: true,
                intensity: 0.35,
                scale: 2.6,
                coverage: 0.0,
                channels: LayerChannels::new(0.0, 0.05, 0.0, 0.1, 0.12),
            },
        ],

        exposure: ExposureLayer {
            enabled: true,
            strength: 0.2,
            exponent: 1.5,
            direction: [0.0, 1.0, 0.0],
            channels: LayerChannels::new(-4.0, 0.1, -0.18, 0.05, 0.0),
        },

        streaks: StreaksLayer {
            enabled: false,
            strength: 0.2,
            ledge_strength: 0.0,
            ..wall.streaks
        },

        wear_top: WearLayer {
            enabled: true,
            intensity: 0.2,
            width: 0.5,
            scale: 0.8,
            channels: LayerChannels::new(0.0, 0.08, -0.1, 0.12, -0.05),
        },
        wear_bottom: WearLayer {
            enabled: true,
            intensity: 0.3,
            width: 0.2,
            scale: 0.9,
            channels: LayerChannels::new(6.0, -0.2, 0.04, 0.12, 0.05),
        },
        wear_side: WearSideLayer {
            band: WearLayer {
                enabled: false,
                intensity: 0.2,
                ..wall.wear_side.band
            },
            use_corner_distance: false,
        },

        cracks_layer: CracksLayer {
            enabled: true,
            strength: 0.15,
            scale: 1.2,
            ..wall.cracks_layer
        },

        anti_tiling: AntiTilingConfig {
            strength: 0.5,
            cell_size: 3.0,
            blend_width: 0.25,
            rotation_degrees: 45.0,
            ..wall.anti_tiling
        },

        legacy_macro: SimpleEffect::new(true, 0.6, 0.25, 0.0),
        detail: SimpleEffect::new(true, 0.35, 2.6, 0.0),
        grime: SimpleEffect::new(true, 0.3, 0.9, 0.2),
        dust: SimpleEffect::new(true, 0.2, 0.8, 0.5),
        sun_bleach: SimpleEffect::new(true, 0.2, 1.0, 0.0),
        soot: SimpleEffect::new(false, 0.2, 0.6, 0.0),
        edge_wear: SimpleEffect::new(false, 0.2, 2.2, 0.8),
        roughness_variation: SimpleEffect::new(true, 0.15, 1.6, 0.0),
        cracks: SimpleEffect::new(true, 0.15, 1.2, 0.0),
        ..wall
    }
}

fn normalized(v: [f32; 3]) -> [f32; 3] {
    let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    [v[0] / len, v[1] / len, v[2] / len]
}
