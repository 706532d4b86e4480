//! HTTP API over the recommendation engine.

pub mod error;
pub mod handlers;
pub mod record;
pub mod routes;

use std::sync::Arc;

use crate::recommender::Recommender;

pub use error::{AppError, AppResult};
pub use record::MovieRecord;
pub use routes::create_router;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub recommender: Arc<Recommender>,
    /// Recommendations returned per title
    pub top_k: usize,
}

impl AppState {
    pub fn new(recommender: Arc<Recommender>, top_k: usize) -> Self {
        Self { recommender, top_k }
    }
}
