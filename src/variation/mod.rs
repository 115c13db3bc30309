//! Procedural material variation.
//!
//! A building's tile footprint seeds a deterministic weathering stack (macro
//! noise, brick, exposure, streaks, wear bands, cracks) that is injected into
//! the standard PBR shader. Configs are normalized against a root preset,
//! packed into a vec4 uniform block, and kept in sync with the compiled
//! program through in-place updates.

pub mod binding;
pub mod composite;
pub mod config;
pub mod migrate;
pub mod normalize;
pub mod presets;
pub mod seed;
pub mod uniforms;

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;

pub use binding::{LiveUniforms, UpdateOutcome, VariationBinding};
pub use config::{MaterialVariationConfig, VariationRoot, VariationSpace};
pub use normalize::normalize_material_variation_config;
pub use seed::{compute_seed_from_tiles, SeedOptions, TileCoord};
pub use uniforms::{MaterialVariationUniforms, UniformInputs};

use crate::material::{CacheKeyFn, CompileHook, Material, ShaderSource, SharedUniformTable, UniformSlot};
use uniforms::SharedUniforms;
use crate::shader::inject_material_variation;

/// Generator version; bump when the injected GLSL changes.
pub const SHADER_VERSION: u32 = 7;

/// Define that turns the injection path on for a material.
pub const USE_MATVAR: &str = "USE_MATVAR";
/// Define set when wear-side reads the per-vertex corner distance.
pub const MATVAR_CORNER_DIST: &str = "MATVAR_CORNER_DIST";
/// Vertex attribute the mesh builder supplies under [`MATVAR_CORNER_DIST`].
pub const CORNER_DIST_ATTRIBUTE: &str = "matVarCornerDist";
/// Uniform table entry holding the packed block.
pub const UNIFORM_BLOCK: &str = "matVar";

/// Attaches and updates variation bindings on materials.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MaterialVariationSystem {
    shader_version: u32,
}

impl Default for MaterialVariationSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl MaterialVariationSystem {
    pub fn new() -> Self {
        Self { shader_version: SHADER_VERSION }
    }

    pub fn with_shader_version(shader_version: u32) -> Self {
        Self { shader_version }
    }

    pub fn shader_version(&self) -> u32 {
        self.shader_version
    }

    /// Suffix appended to the program cache key of attached materials.
    pub fn cache_key_suffix(&self) -> String {
        format!("matvar-v{}", self.shader_version)
    }

    pub fn normalize(&self, input: &Value, root: VariationRoot) -> MaterialVariationConfig {
        normalize_material_variation_config(input, root)
    }

    /// Bind `input` to `material`, replacing any earlier binding.
    ///
    /// Returns whether the material needs the corner-distance attribute.
    pub fn attach(&self, material: &mut Material, input: &Value, root: VariationRoot, inputs: UniformInputs) -> bool {
        let config = self.normalize(input, root);
        let fresh = MaterialVariationUniforms::new(&config, &inputs);
        let uses_corner_dist = config.uses_corner_distance();

        // A compiled program whose key is unchanged keeps its uniform table,
        // so a re-attach writes into the block and live slot it already holds.
        // Hooks chain onto whatever was installed before the first attach.
        let (uniforms, live, previous_hook, previous_cache_key) = match material.user_data.mat_var.take() {
            Some(old) => {
                old.uniforms.borrow_mut().copy_from(&fresh);
                (old.uniforms, old.live, old.previous_hook, old.previous_cache_key)
            }
            None => (
                Rc::new(RefCell::new(fresh)),
                Rc::new(RefCell::new(None)),
                material.on_before_compile().cloned(),
                material.custom_program_cache_key().cloned(),
            ),
        };
        if let Some(live) = live.borrow().as_ref() {
            bind_block(&live.table, &uniforms);
        }

        material.set_define(USE_MATVAR, "");
        toggle_corner_define(material, uses_corner_dist);

        let hook: CompileHook = {
            let previous = previous_hook.clone();
            let uniforms = uniforms.clone();
            let live = live.clone();
            let shader_version = self.shader_version;
            Rc::new(move |shader: &mut ShaderSource| {
                if let Some(previous) = &previous {
                    previous(shader);
                }
                inject_material_variation(shader);
                shader
                    .uniforms
                    .borrow_mut()
                    .insert(UNIFORM_BLOCK.to_string(), UniformSlot::Block(uniforms.clone()));
                *live.borrow_mut() = Some(LiveUniforms { table: shader.uniforms.clone(), shader_version });
            })
        };
        material.set_on_before_compile(Some(hook));

        let cache_key: CacheKeyFn = {
            let previous = previous_cache_key.clone();
            let suffix = self.cache_key_suffix();
            Rc::new(move || match &previous {
                Some(previous) => {
                    let prefix = previous();
                    if prefix.is_empty() { suffix.clone() } else { format!("{prefix}|{suffix}") }
                }
                None => suffix.clone(),
            })
        };
        material.set_custom_program_cache_key(Some(cache_key));

        material.user_data.mat_var = Some(VariationBinding {
            config,
            inputs,
            uniforms,
            live,
            uses_corner_dist,
            shader_version: self.shader_version,
            previous_hook,
            previous_cache_key,
        });
        material.mark_needs_update();

        log::debug!(
            "{}: attached material variation ({root:?}, seed {}, corner dist {uses_corner_dist})",
            material.name,
            inputs.seed
        );
        uses_corner_dist
    }

    /// Apply a new config, in place when the compiled program can keep its shape.
    pub fn update(
        &self,
        material: &mut Material,
        input: &Value,
        root: VariationRoot,
        inputs: UniformInputs,
    ) -> UpdateOutcome {
        let Some(binding) = material.user_data.mat_var.as_mut() else {
            self.attach(material, input, root, inputs);
            return UpdateOutcome::Attached;
        };
        if !self.has_usable_live_binding(binding) {
            log::debug!("{}: live uniforms missing or stale, re-attaching", material.name);
            self.attach(material, input, root, inputs);
            return UpdateOutcome::Attached;
        }

        let config = self.normalize(input, root);
        let fresh = MaterialVariationUniforms::new(&config, &inputs);
        binding.uniforms.borrow_mut().copy_from(&fresh);

        if let Some(live) = binding.live.borrow().as_ref() {
            bind_block(&live.table, &binding.uniforms);
        }

        let uses_corner_dist = config.uses_corner_distance();
        let structural_change = uses_corner_dist != binding.uses_corner_dist;
        binding.config = config;
        binding.inputs = inputs;
        binding.uses_corner_dist = uses_corner_dist;

        if structural_change {
            toggle_corner_define(material, uses_corner_dist);
            material.mark_needs_update();
            log::debug!("{}: corner distance now {uses_corner_dist}, recompiling", material.name);
            UpdateOutcome::Recompile
        } else {
            log::debug!("{}: variation updated in place", material.name);
            UpdateOutcome::InPlace
        }
    }

    fn has_usable_live_binding(&self, binding: &VariationBinding) -> bool {
        if binding.shader_version != self.shader_version {
            return false;
        }
        let live = binding.live.borrow();
        let Some(live) = live.as_ref() else {
            return false;
        };
        live.shader_version == self.shader_version
            && matches!(live.table.borrow().get(UNIFORM_BLOCK), Some(UniformSlot::Block(_)))
    }
}

/// Point the table's block slot at `uniforms` unless it already does.
fn bind_block(table: &SharedUniformTable, uniforms: &SharedUniforms) {
    let mut table = table.borrow_mut();
    let current = matches!(
        table.get(UNIFORM_BLOCK),
        Some(UniformSlot::Block(block)) if Rc::ptr_eq(block, uniforms)
    );
    if !current {
        table.insert(UNIFORM_BLOCK.to_string(), UniformSlot::Block(uniforms.clone()));
    }
}

fn toggle_corner_define(material: &mut Material, enabled: bool) {
    if enabled {
        material.set_define(MATVAR_CORNER_DIST, "");
    } else {
        material.remove_define(MATVAR_CORNER_DIST);
    }
}
