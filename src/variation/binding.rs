//! Per-material variation binding state.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::material::{CacheKeyFn, CompileHook, SharedUniformTable};

use super::config::MaterialVariationConfig;
use super::uniforms::{SharedUniforms, UniformInputs};

/// Uniform table captured from the last compile that ran the hook.
#[derive(Clone, Debug)]
pub struct LiveUniforms {
    pub table: SharedUniformTable,
    /// Generator version that produced the compiled shader.
    pub shader_version: u32,
}

pub type LiveSlot = Rc<RefCell<Option<LiveUniforms>>>;

/// What `update` had to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// No usable live binding; a full attach was performed.
    Attached,
    /// Values copied into the existing uniform block.
    InPlace,
    /// Values copied and a structural define toggled; the program recompiles.
    Recompile,
}

/// Variation state stored in a material's user data.
pub struct VariationBinding {
    pub config: MaterialVariationConfig,
    pub inputs: UniformInputs,
    pub uniforms: SharedUniforms,
    /// Filled by the compile hook; `None` until the material first compiles.
    pub live: LiveSlot,
    pub uses_corner_dist: bool,
    pub shader_version: u32,
    /// Hook and cache key installed before the first attach, restored into
    /// the chain on every re-attach.
    pub(crate) previous_hook: Option<CompileHook>,
    pub(crate) previous_cache_key: Option<CacheKeyFn>,
}

impl VariationBinding {
    pub fn is_live(&self) -> bool {
        self.live.borrow().is_some()
    }

    pub fn previous_hook(&self) -> Option<&CompileHook> {
        self.previous_hook.as_ref()
    }
}

impl fmt::Debug for VariationBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariationBinding")
            .field("config", &self.config)
            .field("inputs", &self.inputs)
            .field("uses_corner_dist", &self.uses_corner_dist)
            .field("shader_version", &self.shader_version)
            .field("live", &self.is_live())
            .field("chained_hook", &self.previous_hook.is_some())
            .finish()
    }
}
