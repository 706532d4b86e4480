//! Feature engineering and content similarity for the movie catalog.
//!
//! This crate provides:
//! - Categorical vocabularies (genre multi-hot, director one-hot)
//! - A word tokenizer producing fixed-length id sequences for the ranking model
//! - TF-IDF overview vectors for content similarity
//! - The combined N x N similarity matrix
//!
//! ## Architecture
//! Everything here runs once at startup:
//! 1. `encode_catalog` fits the vocabularies and encodes every movie
//! 2. `build_similarity` turns the encoded matrices into one similarity matrix
//! 3. `EncodingTables` stay around to encode query movies at request time
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::{build_similarity, encode_catalog, EncoderConfig, SimilarityWeights};
//!
//! let (encoded, tables) = encode_catalog(&catalog, &EncoderConfig::default())?;
//! let similarity = build_similarity(
//!     &encoded.genre_matrix,
//!     &encoded.tfidf_matrix,
//!     &encoded.director_matrix,
//!     &SimilarityWeights::default(),
//! )?;
//!
//! let features = tables.query_features(catalog.find_by_title("Heat").unwrap())?;
//! ```

pub mod category;
pub mod encoder;
pub mod error;
pub mod similarity;
pub mod tfidf;
pub mod tokenizer;

// Re-export main types
pub use category::CategoryIndex;
pub use encoder::{
    encode_catalog, EncodedCatalog, EncoderConfig, EncodingTables, QueryFeatures,
    DEFAULT_MAX_TFIDF_FEATURES, DEFAULT_MAX_WORDS, SEQUENCE_LENGTH,
};
pub use error::{EncodeError, SimilarityError};
pub use similarity::{build_similarity, SimilarityMatrix, SimilarityWeights};
pub use tfidf::{SparseMatrix, SparseVector, TfidfVectorizer};
pub use tokenizer::{TextTokenizer, OOV_ID, PAD_ID};
