//! GLSL fragments spliced into the standard template.

use std::fmt::Write;

use crate::variation::uniforms::UNIFORM_LAYOUT;

use super::stages::{emit_stages, EFFECT_STAGES};

pub const VARYINGS: &str = include_str!("../../shaders/matvar/varyings.glsl");
pub const VERTEX_PARS: &str = include_str!("../../shaders/matvar/vertex_pars.glsl");
pub const VERTEX_NORMAL: &str = include_str!("../../shaders/matvar/vertex_normal.glsl");
pub const VERTEX_WORLDPOS: &str = include_str!("../../shaders/matvar/vertex_worldpos.glsl");

pub const FRAGMENT_GLOBALS: &str = include_str!("../../shaders/matvar/fragment_globals.glsl");
pub const NOISE: &str = include_str!("../../shaders/matvar/noise.glsl");
pub const COLOR: &str = include_str!("../../shaders/matvar/color.glsl");
pub const UV: &str = include_str!("../../shaders/matvar/uv.glsl");
pub const MASKS: &str = include_str!("../../shaders/matvar/masks.glsl");

pub const MAP_FRAGMENT: &str = include_str!("../../shaders/matvar/map_fragment.glsl");
pub const ROUGHNESSMAP_FRAGMENT: &str = include_str!("../../shaders/matvar/roughnessmap_fragment.glsl");
pub const METALNESSMAP_FRAGMENT: &str = include_str!("../../shaders/matvar/metalnessmap_fragment.glsl");
pub const NORMAL_FRAGMENT_MAPS: &str = include_str!("../../shaders/matvar/normal_fragment_maps.glsl");

const COMPOSITE_BEGIN: &str = include_str!("../../shaders/matvar/composite_begin.glsl");
const COMPOSITE_END: &str = include_str!("../../shaders/matvar/composite_end.glsl");

/// `uniform vec4 ...;` lines for the whole block, in layout order.
pub fn uniform_declarations() -> String {
    let mut out = String::new();
    for e in UNIFORM_LAYOUT {
        let _ = if e.len > 1 {
            writeln!(out, "uniform vec4 {}[ {} ];", e.name, e.len)
        } else {
            writeln!(out, "uniform vec4 {};", e.name)
        };
    }
    out
}

pub fn vertex_prelude() -> String {
    [VARYINGS, VERTEX_PARS].concat()
}

/// Declarations and helper library, placed once after `#include <common>`.
pub fn fragment_prelude() -> String {
    [VARYINGS, uniform_declarations().as_str(), FRAGMENT_GLOBALS, NOISE, COLOR, UV, MASKS].concat()
}

/// Roughness resolution followed by the layer composite.
pub fn roughness_and_composite() -> String {
    [ROUGHNESSMAP_FRAGMENT, COMPOSITE_BEGIN, emit_stages(EFFECT_STAGES).as_str(), COMPOSITE_END].concat()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_declarations() {
        let decl = uniform_declarations();
        assert!(decl.contains("uniform vec4 uMatVarConfig0;"));
        assert!(decl.contains("uniform vec4 uMatVarMacroParams[ 4 ];"));
        assert_eq!(decl.lines().count(), UNIFORM_LAYOUT.len());
    }

    #[test]
    fn test_helpers_defined_once() {
        let prelude = fragment_prelude();
        for f in [
            "float mvNoise(",
            "float mvFbm(",
            "float mvRidgedFbm(",
            "vec3 mvHueShift(",
            "vec3 mvSaturation(",
            "vec2 mvPlanarUv(",
            "void mvApplyLayer(",
            "vec4 mvTexture(",
        ] {
            assert_eq!(prelude.matches(f).count(), 1, "{f}");
        }
    }

    #[test]
    fn test_composite_clamps() {
        let glsl = roughness_and_composite();
        assert!(glsl.contains("clamp( mvColor, 0.0, 2.0 )"));
        assert!(glsl.contains("clamp( mvRoughness, 0.03, 1.0 )"));
        assert!(glsl.contains("clamp( mvNormalFactor, 0.0, 2.0 )"));
        assert!(glsl.find("roughnessFactor *= texelRoughness.g").unwrap() < glsl.find("// cavity").unwrap());
    }

    #[test]
    fn test_height_follows_variation_space() {
        let glsl = roughness_and_composite();
        let height = glsl.lines().find(|l| l.contains("float mvHeight =")).unwrap();
        assert!(height.contains("mvObjectSpace ? vMatVarObjectPos.y : vMatVarWorldPos.y"));
        assert!(glsl.find("bool mvObjectSpace").unwrap() < glsl.find("float mvHeight").unwrap());
    }

    #[test]
    fn test_normal_factor_only_in_tangent_path() {
        let object_path_end = NORMAL_FRAGMENT_MAPS.find("#elif defined( USE_NORMALMAP_TANGENTSPACE )").unwrap();
        assert!(!NORMAL_FRAGMENT_MAPS[..object_path_end].contains("mvNormalFactor"));
        assert!(NORMAL_FRAGMENT_MAPS[object_path_end..].contains("normalScale * mvNormalFactor"));
    }
}
