//! Ranking model for movie recommendations.
//!
//! This crate provides:
//! - Inference-only dense, embedding and LSTM layers over `ndarray`
//! - `RankingModel`, the three-branch network scoring every catalog movie
//! - The `Scorer` trait the recommendation engine scores through, with a
//!   `UniformScorer` for similarity-only ranking
//! - JSON weight persistence, shape-checked against the catalog
//!
//! ## Example Usage
//! ```ignore
//! use ranker::{ModelShape, RankingModel, Scorer};
//!
//! let shape = ModelShape::from_tables(&tables, catalog.len());
//! let model = RankingModel::load_or_initialize(weights_path, shape, 42)?;
//! let scores = model.score(&tables.query_features(movie)?)?;
//! ```

pub mod error;
pub mod layers;
pub mod model;
pub mod scorer;

pub use error::{RankerError, Result};
pub use model::{ModelShape, RankingModel, WeightsOrigin};
pub use scorer::{Scorer, UniformScorer};
