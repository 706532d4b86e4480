//! Error types for the ranking model.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while building, loading or running a scorer
#[derive(Error, Debug)]
pub enum RankerError {
    /// Query features don't fit the model's input layers
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A weight tensor has the wrong dimensions
    #[error("Shape mismatch in {layer}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        layer: String,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Failed to access weights file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed weights file: {0}")]
    Format(#[from] serde_json::Error),
}

/// Result alias for ranker operations
pub type Result<T> = std::result::Result<T, RankerError>;
