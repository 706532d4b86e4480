use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::debug;

use data_loader::Movie;

use crate::error::RecommendError;
use crate::recommender::{Recommender, MAX_BATCH_TITLES};

use super::error::{AppError, AppResult};
use super::record::{records, MovieRecord};
use super::AppState;

// Request types

#[derive(Debug, Deserialize)]
pub struct RecommendParams {
    pub title: Option<String>,
}

/// Run recommendation work off the async runtime
async fn run_blocking<T, F>(recommender: &Arc<Recommender>, work: F) -> AppResult<T>
where
    F: FnOnce(&Recommender) -> Result<T, RecommendError> + Send + 'static,
    T: Send + 'static,
{
    let recommender = Arc::clone(recommender);
    let result = tokio::task::spawn_blocking(move || work(&recommender))
        .await
        .map_err(|e| AppError::Internal(format!("recommendation task failed: {}", e)))?;
    Ok(result?)
}

// Handlers

pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "movies": state.recommender.catalog().len(),
    }))
}

pub async fn test_route() -> Json<Value> {
    Json(json!({ "message": "Route is working!" }))
}

pub async fn list_movies(State(state): State<AppState>) -> Json<Vec<MovieRecord>> {
    Json(records(state.recommender.catalog().movies()))
}

pub async fn get_movie(
    State(state): State<AppState>,
    Path(title): Path<String>,
) -> AppResult<Json<MovieRecord>> {
    let movie = state
        .recommender
        .catalog()
        .find_by_title(&title)
        .ok_or_else(|| AppError::from(RecommendError::NotFound(title.clone())))?;

    MovieRecord::try_from(movie)
        .map(Json)
        .map_err(|e| AppError::Internal(format!("cannot normalise '{}': {}", title, e)))
}

pub async fn recommend(
    State(state): State<AppState>,
    Query(params): Query<RecommendParams>,
) -> AppResult<Json<Vec<MovieRecord>>> {
    let title = params
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::InvalidInput("No movie title provided".to_string()))?;

    debug!("Recommendations requested for '{}'", title);
    let top_k = state.top_k;
    let movies = run_blocking(&state.recommender, move |r| r.recommend_one(&title, top_k)).await?;

    Ok(Json(records(&movies)))
}

pub async fn recommend_multi(
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<Json<Map<String, Value>>> {
    let titles = parse_titles(&body)?;
    debug!("Batch recommendations requested for {:?}", titles);

    let top_k = state.top_k;
    let results = run_blocking(&state.recommender, move |r| r.recommend_many(&titles, top_k)).await?;

    let mut response = Map::new();
    for (title, entry) in results {
        response.insert(title, batch_entry(entry)?);
    }
    Ok(Json(response))
}

/// `{"titles": [..]}` with 1 to `MAX_BATCH_TITLES` strings
fn parse_titles(body: &[u8]) -> AppResult<Vec<String>> {
    let data: Value = serde_json::from_slice(body)
        .map_err(|_| AppError::InvalidInput("Request body must be JSON".to_string()))?;

    let titles = data
        .get("titles")
        .ok_or_else(|| AppError::InvalidInput("No movie titles provided".to_string()))?;

    let titles: Vec<String> = titles
        .as_array()
        .and_then(|items| {
            items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
        })
        .ok_or_else(|| {
            AppError::InvalidInput("Movie titles must be provided as a list".to_string())
        })?;

    if titles.is_empty() || titles.len() > MAX_BATCH_TITLES {
        return Err(AppError::InvalidInput(format!(
            "Please provide between 1 and {} movie titles",
            MAX_BATCH_TITLES
        )));
    }
    Ok(titles)
}

fn batch_entry(entry: Result<Vec<Movie>, RecommendError>) -> AppResult<Value> {
    match entry {
        Ok(movies) => serde_json::to_value(records(&movies))
            .map_err(|e| AppError::Internal(format!("cannot serialise records: {}", e))),
        Err(e @ RecommendError::NotFound(_)) => Ok(json!({ "error": e.to_string() })),
        Err(e) => Err(e.into()),
    }
}
