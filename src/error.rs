//! Error types for the moment engine

use thiserror::Error;

/// Errors that can occur while loading or analyzing simulation logs
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to read dataset file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse payload: {0}")]
    Parse(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Encoding error: {0}")]
    Encoding(String),
}
