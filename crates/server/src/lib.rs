//! Server crate for the CineMatch recommendation service.
//!
//! This crate contains the recommendation engine that ties the catalog,
//! the feature pipeline and the ranking model together, plus the HTTP API
//! and configuration of the `cinematch-server` binary.

pub mod api;
pub mod config;
pub mod error;
pub mod recommender;

pub use config::Config;
pub use error::RecommendError;
pub use recommender::{
    select_top_k, BlendPolicy, Recommender, RecommenderSettings, ScorerKind,
    TitleRecommendations, DEFAULT_TOP_K, MAX_BATCH_TITLES,
};
