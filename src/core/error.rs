//! Error types for the fallible edges around the variation core

use thiserror::Error;

/// Main error type for the crate.
///
/// Normalization, uniform building and shader injection never fail; this type
/// covers file loading, strict anchor checks and tool arguments.
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("shader template is missing injection anchors: {}", .0.join(", "))]
    MissingAnchors(Vec<String>),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
