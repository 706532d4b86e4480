//! Errors raised by the recommendation engine.

use pipeline::{EncodeError, SimilarityError};
use ranker::RankerError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecommendError {
    /// The requested title doesn't resolve to a catalog row
    #[error("Movie '{0}' not found in database.")]
    NotFound(String),

    /// Malformed request: empty title, batch size out of bounds, ...
    #[error("{0}")]
    InvalidInput(String),

    #[error("Feature encoding failed: {0}")]
    Encoding(#[from] EncodeError),

    #[error("Similarity construction failed: {0}")]
    Similarity(#[from] SimilarityError),

    #[error("Scoring failed: {0}")]
    Scoring(#[from] RankerError),

    /// Broken invariant between components (e.g. scorer width != catalog size)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RecommendError {
    /// True for the error kinds a caller caused (bad title or bad request)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::InvalidInput(_))
    }
}

pub type Result<T> = std::result::Result<T, RecommendError>;
