//! Error types for feature encoding and similarity construction.

use thiserror::Error;

/// Errors raised while turning movies into feature vectors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EncodeError {
    /// A categorical value (e.g. a director) outside the fitted vocabulary
    #[error("Unknown {field}: {value}")]
    UnknownCategory { field: String, value: String },

    /// Encoding needs at least one movie to fit vocabularies on
    #[error("Cannot encode an empty catalog")]
    EmptyCatalog,
}

/// Errors raised while building the similarity matrix
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimilarityError {
    /// Weights must sum to 1 to keep the combined matrix in [-1, 1]
    #[error("Similarity weights must sum to 1.0, got {sum}")]
    InvalidWeights { sum: f32 },

    /// The three feature matrices disagree on the number of movies
    #[error("Feature matrices have mismatched row counts: genre={genre}, overview={overview}, director={director}")]
    RowCountMismatch {
        genre: usize,
        overview: usize,
        director: usize,
    },
}
