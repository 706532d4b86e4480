use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::AppState;

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/test", get(handlers::test_route))
        // Catalog
        .route("/movies", get(handlers::list_movies))
        .route("/movie/:title", get(handlers::get_movie))
        // Recommendations
        .route("/recommend", get(handlers::recommend))
        .route("/recommend-multi", post(handlers::recommend_multi))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
