//! News Sentiment Service — Binary Entrypoint
//! Boots the Axum HTTP server, wiring the sentiment engine, routes, and
//! metrics exposition.

use std::sync::Arc;

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use news_sentiment_engine::api::{create_router, AppState};
use news_sentiment_engine::cache::FileCache;
use news_sentiment_engine::classify::FinbertClassifier;
use news_sentiment_engine::config::Settings;
use news_sentiment_engine::engine::SentimentEngine;
use news_sentiment_engine::metrics::Metrics;
use news_sentiment_engine::news::NewsApiSource;

/// Enable compact tracing logs in development only.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - SENTIMENT_DEV_LOG=1
fn enable_dev_tracing() {
    let dev_flag = std::env::var("SENTIMENT_DEV_LOG")
        .ok()
        .is_some_and(|v| v == "1");

    let is_dev_env = cfg!(debug_assertions)
        || matches!(
            std::env::var("SHUTTLE_ENV")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "local" | "development" | "dev"
        );

    if !(dev_flag && is_dev_env) {
        return;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("news_sentiment_engine=debug,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    // Initialize dev tracing early (no-op in production).
    enable_dev_tracing();

    // Missing credentials are fatal here, before any engine exists.
    let settings = Settings::from_env().expect("Failed to load settings");

    let metrics = Metrics::init(settings.cache_ttl_secs);

    let engine = SentimentEngine::new(
        Arc::new(NewsApiSource::new(settings.news_api_key.clone())),
        Arc::new(FinbertClassifier::new(settings.hf_api_token.clone())),
        Arc::new(FileCache::new(settings.cache_dir.clone())),
        settings.cache_ttl_secs,
    );

    let state = AppState {
        engine: Arc::new(engine),
    };
    let router = create_router(state).merge(metrics.router());

    Ok(router.into())
}
