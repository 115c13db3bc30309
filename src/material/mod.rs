//! Renderer-agnostic material model.
//!
//! Just enough of a physically-based material for the variation system to
//! hook into: a defines map, a compile hook, an overridable program cache key
//! and a `needs_update` flag. [`ProgramCache`] plays the renderer's part.

pub mod program;
pub mod template;

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt::{self, Write};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

pub use program::{Program, ProgramCache};
pub use template::ShaderTemplate;

use crate::core::types::{Vec2, Vec3, Vec4};
use crate::variation::binding::VariationBinding;
use crate::variation::uniforms::SharedUniforms;

/// Hook run on the shader source before a program is compiled.
pub type CompileHook = Rc<dyn Fn(&mut ShaderSource)>;
/// Extra text folded into the program cache key.
pub type CacheKeyFn = Rc<dyn Fn() -> String>;

/// A value bound to a named shader uniform.
#[derive(Clone, Debug)]
pub enum UniformSlot {
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    /// A packed vec4 block shared with its producer.
    Block(SharedUniforms),
}

pub type UniformTable = BTreeMap<String, UniformSlot>;
pub type SharedUniformTable = Rc<RefCell<UniformTable>>;

/// Mutable shader state handed to compile hooks.
#[derive(Clone, Debug)]
pub struct ShaderSource {
    pub name: String,
    pub vertex_shader: String,
    pub fragment_shader: String,
    pub defines: BTreeMap<String, String>,
    pub uniforms: SharedUniformTable,
}

impl ShaderSource {
    pub fn new(
        name: impl Into<String>,
        vertex_shader: impl Into<String>,
        fragment_shader: impl Into<String>,
        defines: BTreeMap<String, String>,
    ) -> Self {
        Self {
            name: name.into(),
            vertex_shader: vertex_shader.into(),
            fragment_shader: fragment_shader.into(),
            defines,
            uniforms: Rc::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum NormalMapType {
    #[default]
    TangentSpace,
    ObjectSpace,
}

/// Which texture maps a material samples.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TextureMaps {
    pub map: bool,
    pub roughness_map: bool,
    pub metalness_map: bool,
    pub normal_map: bool,
    pub ao_map: bool,
    pub emissive_map: bool,
}

impl TextureMaps {
    pub fn all() -> Self {
        Self {
            map: true,
            roughness_map: true,
            metalness_map: true,
            normal_map: true,
            ao_map: true,
            emissive_map: true,
        }
    }
}

/// Per-material data owned by integrations.
#[derive(Debug, Default)]
pub struct MaterialUserData {
    /// At most one variation binding; re-attaching replaces it.
    pub mat_var: Option<VariationBinding>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(u64);

static NEXT_MATERIAL_ID: AtomicU64 = AtomicU64::new(1);

/// A physically-based material instance.
pub struct Material {
    id: MaterialId,
    pub name: String,
    pub color: Vec3,
    pub roughness: f32,
    pub metalness: f32,
    pub normal_scale: Vec2,
    pub maps: TextureMaps,
    pub normal_map_type: NormalMapType,
    pub defines: BTreeMap<String, String>,
    pub user_data: MaterialUserData,
    on_before_compile: Option<CompileHook>,
    custom_program_cache_key: Option<CacheKeyFn>,
    needs_update: bool,
    version: u32,
}

impl Material {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: MaterialId(NEXT_MATERIAL_ID.fetch_add(1, Ordering::Relaxed)),
            name: name.into(),
            color: Vec3::ONE,
            roughness: 1.0,
            metalness: 0.0,
            normal_scale: Vec2::ONE,
            maps: TextureMaps::default(),
            normal_map_type: NormalMapType::default(),
            defines: BTreeMap::new(),
            user_data: MaterialUserData::default(),
            on_before_compile: None,
            custom_program_cache_key: None,
            needs_update: true,
            version: 0,
        }
    }

    pub fn with_maps(mut self, maps: TextureMaps) -> Self {
        self.maps = maps;
        self
    }

    pub fn with_normal_map_type(mut self, normal_map_type: NormalMapType) -> Self {
        self.normal_map_type = normal_map_type;
        self
    }

    pub fn id(&self) -> MaterialId {
        self.id
    }

    /// Returns whether the defines changed.
    pub fn set_define(&mut self, key: &str, value: &str) -> bool {
        if self.defines.get(key).is_some_and(|v| v == value) {
            return false;
        }
        self.defines.insert(key.to_string(), value.to_string());
        true
    }

    pub fn remove_define(&mut self, key: &str) -> bool {
        self.defines.remove(key).is_some()
    }

    pub fn has_define(&self, key: &str) -> bool {
        self.defines.contains_key(key)
    }

    pub fn on_before_compile(&self) -> Option<&CompileHook> {
        self.on_before_compile.as_ref()
    }

    pub fn set_on_before_compile(&mut self, hook: Option<CompileHook>) {
        self.on_before_compile = hook;
    }

    pub fn custom_program_cache_key(&self) -> Option<&CacheKeyFn> {
        self.custom_program_cache_key.as_ref()
    }

    pub fn set_custom_program_cache_key(&mut self, key: Option<CacheKeyFn>) {
        self.custom_program_cache_key = key;
    }

    /// Request recompilation on the next prepare.
    pub fn mark_needs_update(&mut self) {
        self.needs_update = true;
        self.version = self.version.wrapping_add(1);
    }

    pub fn needs_update(&self) -> bool {
        self.needs_update
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub(crate) fn acknowledge_update(&mut self) {
        self.needs_update = false;
    }

    /// Defines the renderer derives from the map setup plus the explicit ones.
    pub fn shader_defines(&self) -> BTreeMap<String, String> {
        let mut defines = self.defines.clone();
        let maps = &self.maps;
        for (on, name) in [
            (maps.map, "USE_MAP"),
            (maps.roughness_map, "USE_ROUGHNESSMAP"),
            (maps.metalness_map, "USE_METALNESSMAP"),
            (maps.ao_map, "USE_AOMAP"),
            (maps.emissive_map, "USE_EMISSIVEMAP"),
        ] {
            if on {
                defines.insert(name.to_string(), String::new());
            }
        }
        if maps.normal_map {
            defines.insert("USE_NORMALMAP".to_string(), String::new());
            let space = match self.normal_map_type {
                NormalMapType::TangentSpace => "USE_NORMALMAP_TANGENTSPACE",
                NormalMapType::ObjectSpace => "USE_NORMALMAP_OBJECTSPACE",
            };
            defines.insert(space.to_string(), String::new());
        }
        defines
    }

    /// Key identifying the compiled program this material needs.
    pub fn program_cache_key(&self) -> String {
        let mut key = String::from("standard");
        for (name, value) in self.shader_defines() {
            let _ = write!(key, ";{name}={value}");
        }
        if let Some(custom) = &self.custom_program_cache_key {
            let _ = write!(key, "|{}", custom());
        }
        key
    }
}

impl fmt::Debug for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Material")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("maps", &self.maps)
            .field("normal_map_type", &self.normal_map_type)
            .field("defines", &self.defines)
            .field("user_data", &self.user_data)
            .field("has_compile_hook", &self.on_before_compile.is_some())
            .field("needs_update", &self.needs_update)
            .field("version", &self.version)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_unique() {
        assert_ne!(Material::new("a").id(), Material::new("b").id());
    }

    #[test]
    fn test_set_define_reports_change() {
        let mut m = Material::new("wall");
        assert!(m.set_define("FOO", "1"));
        assert!(!m.set_define("FOO", "1"));
        assert!(m.set_define("FOO", "2"));
        assert!(m.remove_define("FOO"));
        assert!(!m.remove_define("FOO"));
    }

    #[test]
    fn test_map_defines() {
        let m = Material::new("wall")
            .with_maps(TextureMaps { map: true, normal_map: true, ..Default::default() })
            .with_normal_map_type(NormalMapType::ObjectSpace);
        let defines = m.shader_defines();
        assert!(defines.contains_key("USE_MAP"));
        assert!(defines.contains_key("USE_NORMALMAP_OBJECTSPACE"));
        assert!(!defines.contains_key("USE_ROUGHNESSMAP"));
    }

    #[test]
    fn test_cache_key_includes_defines_and_custom() {
        let mut m = Material::new("wall");
        let base = m.program_cache_key();
        m.set_define("EXTRA", "");
        let with_define = m.program_cache_key();
        assert_ne!(base, with_define);

        m.set_custom_program_cache_key(Some(Rc::new(|| "custom-1".to_string())));
        assert!(m.program_cache_key().ends_with("|custom-1"));
    }

    #[test]
    fn test_needs_update_bumps_version() {
        let mut m = Material::new("wall");
        assert!(m.needs_update());
        m.acknowledge_update();
        assert!(!m.needs_update());
        m.mark_needs_update();
        assert!(m.needs_update());
        assert_eq!(m.version(), 1);
    }
}
