//! Material-variation shader injection.
//!
//! The standard template exposes named `#include <...>` slots. Injection is a
//! list of [`Splice`]s, one per [`InjectionPoint`], each placed before, after
//! or in place of its slot. Texture lookups left in the fragment body are
//! rerouted through `mvTexture` so they pick up stair-shift and anti-tiling.

pub mod chunks;
pub mod injector;
pub mod stages;

use std::fmt;

pub use injector::{inject_material_variation, material_variation_splices, INJECTION_MARKER};
pub use stages::{EffectStage, EFFECT_STAGES};

use crate::core::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

/// Where a splice lands relative to its anchor line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Placement {
    Before,
    After,
    Replace,
}

/// Named slot of the standard shading template.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InjectionPoint {
    VertexPrelude,
    VertexNormal,
    VertexWorldPosition,
    FragmentPrelude,
    DiffuseMap,
    RoughnessMap,
    MetalnessMap,
    NormalMaps,
}

impl InjectionPoint {
    pub const ALL: [InjectionPoint; 8] = [
        Self::VertexPrelude,
        Self::VertexNormal,
        Self::VertexWorldPosition,
        Self::FragmentPrelude,
        Self::DiffuseMap,
        Self::RoughnessMap,
        Self::MetalnessMap,
        Self::NormalMaps,
    ];

    pub fn stage(self) -> ShaderStage {
        match self {
            Self::VertexPrelude | Self::VertexNormal | Self::VertexWorldPosition => ShaderStage::Vertex,
            _ => ShaderStage::Fragment,
        }
    }

    /// Include chunk name the slot is anchored on.
    pub fn anchor(self) -> &'static str {
        match self {
            Self::VertexPrelude | Self::FragmentPrelude => "common",
            Self::VertexNormal => "defaultnormal_vertex",
            Self::VertexWorldPosition => "worldpos_vertex",
            Self::DiffuseMap => "map_fragment",
            Self::RoughnessMap => "roughnessmap_fragment",
            Self::MetalnessMap => "metalnessmap_fragment",
            Self::NormalMaps => "normal_fragment_maps",
        }
    }

    pub fn placement(self) -> Placement {
        match self {
            Self::VertexPrelude | Self::VertexNormal | Self::VertexWorldPosition | Self::FragmentPrelude => {
                Placement::After
            }
            Self::DiffuseMap | Self::RoughnessMap | Self::MetalnessMap | Self::NormalMaps => Placement::Replace,
        }
    }
}

impl fmt::Display for InjectionPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self.stage() {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
        };
        write!(f, "{stage}:#include <{}>", self.anchor())
    }
}

/// GLSL text bound to one injection point.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Splice {
    pub point: InjectionPoint,
    pub code: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InjectionStatus {
    Injected,
    /// Source already carried the injection marker; nothing changed.
    AlreadyInjected,
    /// The material does not request variation (`USE_MATVAR` absent).
    NotRequested,
}

/// Outcome of one injection pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InjectionReport {
    pub status: InjectionStatus,
    pub applied: Vec<InjectionPoint>,
    pub missing: Vec<InjectionPoint>,
    pub rewritten_call_sites: usize,
}

impl InjectionReport {
    pub(crate) fn skipped(status: InjectionStatus) -> Self {
        Self { status, applied: Vec::new(), missing: Vec::new(), rewritten_call_sites: 0 }
    }

    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    /// Fail with [`Error::MissingAnchors`] when any slot was not found.
    pub fn into_result(self) -> Result<Self> {
        if self.missing.is_empty() {
            Ok(self)
        } else {
            Err(Error::MissingAnchors(self.missing.iter().map(ToString::to_string).collect()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_stages() {
        assert_eq!(InjectionPoint::VertexWorldPosition.stage(), ShaderStage::Vertex);
        assert_eq!(InjectionPoint::NormalMaps.stage(), ShaderStage::Fragment);
        assert_eq!(InjectionPoint::RoughnessMap.placement(), Placement::Replace);
    }

    #[test]
    fn test_display() {
        assert_eq!(InjectionPoint::DiffuseMap.to_string(), "fragment:#include <map_fragment>");
    }

    #[test]
    fn test_into_result() {
        let ok = InjectionReport::skipped(InjectionStatus::NotRequested);
        assert!(ok.clone().into_result().is_ok());

        let report = InjectionReport {
            status: InjectionStatus::Injected,
            applied: vec![InjectionPoint::VertexPrelude],
            missing: vec![InjectionPoint::NormalMaps],
            rewritten_call_sites: 0,
        };
        match report.into_result() {
            Err(Error::MissingAnchors(names)) => {
                assert_eq!(names, vec!["fragment:#include <normal_fragment_maps>".to_string()]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
