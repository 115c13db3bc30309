//! Program cache standing in for the renderer's compile step.
//!
//! Programs are shared across materials by cache key. Each material keeps its
//! own uniform table per key, so the compile hook runs once per material and
//! key, while GLSL is "compiled" once per key.

use std::collections::HashMap;
use std::fmt::Write;
use std::rc::Rc;

use super::{Material, MaterialId, SharedUniformTable, ShaderTemplate, UniformSlot};

/// A linked program: final sources with the define prefix applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Program {
    pub key: String,
    pub vertex_shader: String,
    pub fragment_shader: String,
}

impl Program {
    fn link(key: &str, source: &super::ShaderSource) -> Self {
        let mut prefix = String::new();
        for (name, value) in &source.defines {
            let _ = writeln!(prefix, "#define {name} {value}");
        }
        Self {
            key: key.to_string(),
            vertex_shader: format!("{prefix}{}", source.vertex_shader),
            fragment_shader: format!("{prefix}{}", source.fragment_shader),
        }
    }
}

struct BoundProgram {
    program: Rc<Program>,
    uniforms: SharedUniformTable,
}

#[derive(Default)]
struct MaterialState {
    current: Option<String>,
    bound: HashMap<String, BoundProgram>,
}

/// Explicit program cache; create one per renderer and reset it in tests.
pub struct ProgramCache {
    template: ShaderTemplate,
    programs: HashMap<String, Rc<Program>>,
    states: HashMap<MaterialId, MaterialState>,
    compile_count: usize,
}

impl Default for ProgramCache {
    fn default() -> Self {
        Self::new(ShaderTemplate::standard())
    }
}

impl ProgramCache {
    pub fn new(template: ShaderTemplate) -> Self {
        Self {
            template,
            programs: HashMap::new(),
            states: HashMap::new(),
            compile_count: 0,
        }
    }

    /// Resolve the program for `material`, running its compile hook and
    /// compiling only when the key is new to it.
    pub fn prepare(&mut self, material: &mut Material) -> Rc<Program> {
        let key = material.program_cache_key();
        let state = self.states.entry(material.id()).or_default();

        if !material.needs_update() && state.current.as_deref() == Some(key.as_str()) {
            if let Some(bound) = state.bound.get(&key) {
                return bound.program.clone();
            }
        }
        material.acknowledge_update();

        if let Some(bound) = state.bound.get(&key) {
            state.current = Some(key);
            return bound.program.clone();
        }

        let mut source = self.template.instantiate(material);
        if let Some(hook) = material.on_before_compile() {
            hook(&mut source);
        }

        let compile_count = &mut self.compile_count;
        let program = self
            .programs
            .entry(key.clone())
            .or_insert_with(|| {
                *compile_count += 1;
                log::debug!("compiling program #{} for key {key}", *compile_count);
                Rc::new(Program::link(&key, &source))
            })
            .clone();

        state.bound.insert(
            key.clone(),
            BoundProgram { program: program.clone(), uniforms: source.uniforms.clone() },
        );
        state.current = Some(key);
        program
    }

    /// Current program of `material`, if prepared.
    pub fn program(&self, material: &Material) -> Option<Rc<Program>> {
        self.current(material).map(|b| b.program.clone())
    }

    /// Live uniform table of `material`'s current program.
    pub fn uniforms(&self, material: &Material) -> Option<SharedUniformTable> {
        self.current(material).map(|b| b.uniforms.clone())
    }

    fn current(&self, material: &Material) -> Option<&BoundProgram> {
        let state = self.states.get(&material.id())?;
        state.bound.get(state.current.as_deref()?)
    }

    /// Byte images of the dirty uniform blocks of `material`; clears their dirty flags.
    pub fn upload(&self, material: &Material) -> Vec<(String, Vec<u8>)> {
        let Some(table) = self.uniforms(material) else {
            return Vec::new();
        };
        let table = table.borrow();
        let mut uploads = Vec::new();
        for (name, slot) in table.iter() {
            let UniformSlot::Block(block) = slot else { continue };
            let mut block = block.borrow_mut();
            if !block.is_dirty() {
                continue;
            }
            uploads.push((name.clone(), bytemuck::bytes_of(&block.to_gpu()).to_vec()));
            block.clear_dirty();
        }
        uploads
    }

    /// Number of distinct programs compiled since creation or the last clear.
    pub fn compile_count(&self) -> usize {
        self.compile_count
    }

    pub fn program_count(&self) -> usize {
        self.programs.len()
    }

    pub fn clear(&mut self) {
        self.programs.clear();
        self.states.clear();
        self.compile_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_compile_once_per_key() {
        let mut cache = ProgramCache::default();
        let mut a = Material::new("a");
        let mut b = Material::new("b");
        cache.prepare(&mut a);
        cache.prepare(&mut a);
        cache.prepare(&mut b);
        assert_eq!(cache.compile_count(), 1);
        assert_eq!(cache.program_count(), 1);

        b.set_define("EXTRA", "1");
        b.mark_needs_update();
        cache.prepare(&mut b);
        assert_eq!(cache.compile_count(), 2);
    }

    #[test]
    fn test_hook_runs_once_per_material_key() {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let mut m = Material::new("m");
        m.set_on_before_compile(Some(Rc::new(move |_src: &mut crate::material::ShaderSource| {
            counter.set(counter.get() + 1);
        })));
        let mut cache = ProgramCache::default();
        cache.prepare(&mut m);
        cache.prepare(&mut m);
        m.mark_needs_update();
        cache.prepare(&mut m);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_defines_prefixed() {
        let mut m = Material::new("m");
        m.set_define("FOO", "3");
        let mut cache = ProgramCache::default();
        let program = cache.prepare(&mut m);
        assert!(program.fragment_shader.starts_with("#define FOO 3\n"));
    }

    #[test]
    fn test_clear() {
        let mut cache = ProgramCache::default();
        let mut m = Material::new("m");
        cache.prepare(&mut m);
        cache.clear();
        assert_eq!(cache.compile_count(), 0);
        assert!(cache.program(&m).is_none());
        assert!(cache.upload(&m).is_empty());
    }
}
