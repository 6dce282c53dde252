//! Error types for the import boundary and the collapse session.

use crate::types::Vec3;
use thiserror::Error;

/// Malformed layout or prediction input. Raised before any session state
/// is touched.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid layout format: expected a JSON array of buildings")]
    NotAnArray,

    #[error("record {index}: expected a JSON object")]
    NotAnObject { index: usize },

    #[error("record {index}: missing or non-numeric `{field}`")]
    MissingField { index: usize, field: &'static str },

    #[error("record {index}: size components must be positive, got {size}")]
    InvalidSize { index: usize, size: Vec3 },

    #[error("duplicate building id `{0}`")]
    DuplicateId(String),

    #[error("prediction response has no `predictions`")]
    MissingPredictions,
}

#[derive(Debug, Error)]
pub enum QuakeError {
    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error("unknown building `{0}`")]
    UnknownBuilding(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, QuakeError>;
