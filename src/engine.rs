//! # Sentiment Engine
//! Orchestrates the pipeline: cache lookup → article fetch → filtering and
//! composition → per-article classification → decay-weighted aggregation →
//! cache write. Collaborators are trait objects so tests and alternate
//! providers plug in without touching this module.

use std::sync::Arc;

use anyhow::{Context, Result};
use metrics::{counter, describe_counter, describe_histogram};
use once_cell::sync::OnceCell;

use crate::cache::CacheStore;
use crate::classify::SentimentClassifier;
use crate::compose::prepare_texts;
use crate::decay::aggregate;
use crate::news::ArticleSource;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "sentiment_cache_hits_total",
            "Requests answered from the aggregate cache."
        );
        describe_counter!(
            "sentiment_cache_misses_total",
            "Requests that went through fetch + inference."
        );
        describe_counter!(
            "sentiment_scored_articles_total",
            "Articles that reached the classifier."
        );
        describe_counter!("news_fetch_errors_total", "Article source failures.");
        describe_counter!("news_articles_total", "Raw articles returned by providers.");
        describe_histogram!("news_fetch_ms", "Article fetch time in milliseconds.");
    });
}

/// Derive the cache key for a `(query, n, lookback)` triple.
///
/// Pure and stable across restarts; the same triple always yields the same
/// key. The query is not escaped: a query that itself contains the literal
/// ` lookback=`/` n=` separators could collide with a different triple.
/// Known limitation, kept for non-adversarial inputs.
pub fn cache_key(query: &str, n: u32, lookback_days: u32) -> String {
    format!("{query} lookback={lookback_days} n={n}")
}

/// Whether a request was served from cache. Surfaced to the HTTP layer as
/// the `X-Sentiment-Cache` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    Hit,
    Miss,
}

#[derive(Debug, Clone, Copy)]
pub struct Resolved {
    pub score: f64,
    pub outcome: CacheOutcome,
}

pub struct SentimentEngine {
    source: Arc<dyn ArticleSource>,
    classifier: Arc<dyn SentimentClassifier>,
    cache: Arc<dyn CacheStore>,
    ttl_secs: u64,
}

impl SentimentEngine {
    pub fn new(
        source: Arc<dyn ArticleSource>,
        classifier: Arc<dyn SentimentClassifier>,
        cache: Arc<dyn CacheStore>,
        ttl_secs: u64,
    ) -> Self {
        ensure_metrics_described();
        Self {
            source,
            classifier,
            cache,
            ttl_secs,
        }
    }

    /// Time-decayed sentiment for `query`, at most one fetch + inference
    /// pass per key per TTL. Fetch and classification failures propagate
    /// untouched; a classifier failure on any single article aborts the
    /// whole request rather than silently skipping it.
    ///
    /// Concurrent calls for the same key are not coalesced: both run the
    /// full pipeline and the later cache write wins.
    pub async fn get_sentiment(&self, query: &str, n: u32, lookback_days: u32) -> Result<f64> {
        Ok(self.resolve(query, n, lookback_days).await?.score)
    }

    /// Like [`get_sentiment`](Self::get_sentiment) but reports whether the
    /// value came from cache.
    pub async fn resolve(&self, query: &str, n: u32, lookback_days: u32) -> Result<Resolved> {
        let key = cache_key(query, n, lookback_days);

        if let Some(score) = self.cache.get(&key) {
            counter!("sentiment_cache_hits_total").increment(1);
            tracing::debug!(%key, score, "cache hit");
            return Ok(Resolved {
                score,
                outcome: CacheOutcome::Hit,
            });
        }
        counter!("sentiment_cache_misses_total").increment(1);

        let articles = self
            .source
            .fetch(query, n, lookback_days)
            .await
            .with_context(|| format!("fetching articles via {}", self.source.name()))?;

        let texts = prepare_texts(&articles);

        let mut scores = Vec::with_capacity(texts.len());
        for text in &texts {
            let probs = self
                .classifier
                .classify(text)
                .await
                .with_context(|| format!("classifying article via {}", self.classifier.name()))?;
            probs.validate()?;
            scores.push(probs.polarity());
        }
        counter!("sentiment_scored_articles_total").increment(scores.len() as u64);

        let score = aggregate(&scores);

        // Unconditional write, including the empty-result neutral default.
        self.cache.put(&key, score, self.ttl_secs);
        tracing::info!(
            %key,
            fetched = articles.len(),
            scored = scores.len(),
            score,
            "sentiment computed"
        );

        Ok(Resolved {
            score,
            outcome: CacheOutcome::Miss,
        })
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_matches_fixed_format() {
        assert_eq!(cache_key("tesla", 10, 7), "tesla lookback=7 n=10");
    }

    #[test]
    fn cache_key_is_deterministic() {
        assert_eq!(cache_key("q", 5, 3), cache_key("q", 5, 3));
        assert_ne!(cache_key("q", 5, 3), cache_key("q", 5, 4));
        assert_ne!(cache_key("q", 5, 3), cache_key("q", 6, 3));
        assert_ne!(cache_key("q", 5, 3), cache_key("q2", 5, 3));
    }
}
