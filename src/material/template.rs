//! Shading templates with `#include <...>` slots.

use std::rc::Rc;
use std::cell::RefCell;

use super::{Material, ShaderSource, UniformSlot, UniformTable};

const MESH_PHYSICAL_VERT: &str = include_str!("../../shaders/standard/meshphysical.vert.glsl");
const MESH_PHYSICAL_FRAG: &str = include_str!("../../shaders/standard/meshphysical.frag.glsl");

/// Unexpanded vertex/fragment pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShaderTemplate {
    pub name: String,
    pub vertex_shader: String,
    pub fragment_shader: String,
}

impl ShaderTemplate {
    /// The physically-based template the variation injector is written against.
    pub fn standard() -> Self {
        Self {
            name: "meshphysical".to_string(),
            vertex_shader: MESH_PHYSICAL_VERT.to_string(),
            fragment_shader: MESH_PHYSICAL_FRAG.to_string(),
        }
    }

    /// Source for `material`, with its defines and base uniforms filled in.
    pub fn instantiate(&self, material: &Material) -> ShaderSource {
        let mut uniforms = UniformTable::new();
        uniforms.insert("diffuse".into(), UniformSlot::Vec3(material.color));
        uniforms.insert("roughness".into(), UniformSlot::Float(material.roughness));
        uniforms.insert("metalness".into(), UniformSlot::Float(material.metalness));
        uniforms.insert("normalScale".into(), UniformSlot::Vec2(material.normal_scale));

        ShaderSource {
            name: format!("{}:{}", self.name, material.name),
            vertex_shader: self.vertex_shader.clone(),
            fragment_shader: self.fragment_shader.clone(),
            defines: material.shader_defines(),
            uniforms: Rc::new(RefCell::new(uniforms)),
        }
    }
}

impl Default for ShaderTemplate {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::InjectionPoint;
    use crate::shader::injector::find_include;

    #[test]
    fn test_standard_has_every_anchor() {
        let t = ShaderTemplate::standard();
        for point in InjectionPoint::ALL {
            let text = match point.stage() {
                crate::shader::ShaderStage::Vertex => &t.vertex_shader,
                crate::shader::ShaderStage::Fragment => &t.fragment_shader,
            };
            assert!(find_include(text, point.anchor()).is_some(), "{point} missing");
        }
    }

    #[test]
    fn test_instantiate() {
        let mut m = Material::new("roof");
        m.roughness = 0.4;
        m.set_define("FOO", "1");
        let src = ShaderTemplate::standard().instantiate(&m);
        assert_eq!(src.name, "meshphysical:roof");
        assert_eq!(src.defines.get("FOO").map(String::as_str), Some("1"));
        assert!(matches!(src.uniforms.borrow().get("roughness"), Some(UniformSlot::Float(r)) if *r == 0.4));
    }
}
