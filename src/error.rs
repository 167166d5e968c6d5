//! Error types for the lucidtree attribution toolkit

use thiserror::Error;

/// Result type alias for lucidtree operations
pub type Result<T> = std::result::Result<T, ExplainError>;

/// Main error type for the lucidtree toolkit
#[derive(Error, Debug)]
pub enum ExplainError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("Model error: {0}")]
    ModelError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Class index {requested} out of range for a model with {n_classes} classes")]
    InvalidClassIndex { requested: usize, n_classes: usize },

    #[error("Render error: {0}")]
    RenderError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<polars::error::PolarsError> for ExplainError {
    fn from(err: polars::error::PolarsError) -> Self {
        ExplainError::DataError(err.to_string())
    }
}

impl From<bincode::Error> for ExplainError {
    fn from(err: bincode::Error) -> Self {
        ExplainError::SerializationError(err.to_string())
    }
}

impl From<serde_json::Error> for ExplainError {
    fn from(err: serde_json::Error) -> Self {
        ExplainError::SerializationError(err.to_string())
    }
}
