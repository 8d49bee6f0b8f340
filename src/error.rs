//! Error types for the gradecast pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for cleaning, grading, training, and prediction
#[derive(Error, Debug)]
pub enum GradecastError {
    /// A raw data file or model artifact does not exist
    #[error("input not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// The input table cannot support the pipeline (no subject columns, no label column, ...)
    #[error("schema error: {0}")]
    Schema(String),

    /// Data offered for training or prediction lacks required feature columns
    #[error("feature mismatch: missing column(s) [{}]", .missing.join(", "))]
    FeatureMismatch { missing: Vec<String> },

    /// A persisted artifact is unreadable, incomplete, or internally inconsistent
    #[error("artifact corrupt: {0}")]
    ArtifactCorrupt(String),

    /// An operation was invoked with input it cannot accept
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Predict called before fit
    #[error("classifier is not fitted")]
    NotFitted,

    /// Matrix dimensions do not line up
    #[error("shape mismatch: expected {expected}, got {actual}")]
    Shape { expected: String, actual: String },

    /// DataFrame-level failure
    #[error("data error: {0}")]
    Data(String),

    /// Serialization failure outside the artifact load path
    #[error("serialization error: {0}")]
    Serialization(String),

    /// IO failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for gradecast operations
pub type Result<T> = std::result::Result<T, GradecastError>;

impl From<polars::prelude::PolarsError> for GradecastError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        GradecastError::Data(err.to_string())
    }
}

impl From<serde_json::Error> for GradecastError {
    fn from(err: serde_json::Error) -> Self {
        GradecastError::Serialization(err.to_string())
    }
}
