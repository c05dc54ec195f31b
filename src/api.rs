use std::sync::Arc;

use shuttle_axum::axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::engine::{CacheOutcome, SentimentEngine};

/// Diagnostic header reporting whether the score came from cache.
pub const CACHE_HEADER: &str = "X-Sentiment-Cache";

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SentimentEngine>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/sentiment", get(sentiment))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

fn default_n() -> u32 {
    10
}
fn default_lookback() -> u32 {
    7
}

#[derive(serde::Deserialize)]
struct SentimentParams {
    query: String,
    #[serde(default = "default_n")]
    n: u32,
    #[serde(default = "default_lookback")]
    lookback: u32,
}

#[derive(serde::Serialize)]
struct SentimentResp {
    query: String,
    n: u32,
    lookback_days: u32,
    score: f64,
    cached: bool,
}

async fn sentiment(
    State(state): State<AppState>,
    Query(params): Query<SentimentParams>,
) -> impl IntoResponse {
    if params.query.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, "query must not be empty").into_response();
    }
    if params.n == 0 {
        return (StatusCode::BAD_REQUEST, "n must be positive").into_response();
    }

    match state
        .engine
        .resolve(&params.query, params.n, params.lookback)
        .await
    {
        Ok(resolved) => {
            let cached = resolved.outcome == CacheOutcome::Hit;
            let header_value = if cached { "HIT" } else { "MISS" };
            let body = Json(SentimentResp {
                query: params.query,
                n: params.n,
                lookback_days: params.lookback,
                score: resolved.score,
                cached,
            });
            ([(CACHE_HEADER, header_value)], body).into_response()
        }
        Err(e) => {
            tracing::warn!(error = ?e, query = %params.query, "sentiment request failed");
            (StatusCode::BAD_GATEWAY, format!("upstream failure: {e:#}")).into_response()
        }
    }
}
