// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod cache;
pub mod classify;
pub mod compose;
pub mod config;
pub mod decay;
pub mod engine;
pub mod metrics;
pub mod news;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState};
pub use crate::cache::{CacheStore, FileCache, MemoryCache};
pub use crate::classify::{ClassProbs, FinbertClassifier, SentimentClassifier};
pub use crate::engine::{cache_key, CacheOutcome, SentimentEngine};
pub use crate::news::{ArticleRecord, ArticleSource, NewsApiSource};
