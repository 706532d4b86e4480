//! CineMatch HTTP server.
//!
//! Loads the catalog, builds the recommender once, then serves the JSON API.
//! Configuration comes from `CINEMATCH_*` environment variables (see
//! `server::config`).

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use data_loader::Catalog;
use server::api::{create_router, AppState};
use server::{Config, Recommender};

const DEFAULT_LOG_FILTER: &str = "info,server=debug,pipeline=debug,ranker=debug";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    info!("Starting CineMatch server");

    let config = Config::from_env()?;
    info!("Configuration loaded: {:?}", config);

    // Encoding, similarity and model setup are CPU-bound
    let startup = config.clone();
    let recommender = tokio::task::spawn_blocking(move || -> Result<Recommender> {
        info!("Loading catalog from {}", startup.catalog_path.display());
        let catalog = Catalog::load_from_csv(&startup.catalog_path)
            .with_context(|| format!("Loading catalog from {}", startup.catalog_path.display()))?;

        Recommender::build(catalog, &startup.recommender_settings())
            .context("Building recommender")
    })
    .await
    .context("Startup task panicked")??;

    let state = AppState::new(Arc::new(recommender), config.top_k);
    let app = create_router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Binding {}", addr))?;
    info!("Server running on http://{}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
