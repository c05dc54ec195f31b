//! Engine pipeline tests with mocked collaborators.
//!
//! Covered (strict):
//! - MISS → HIT for an identical triple: exactly one fetch and one
//!   classifier call per qualifying article
//! - empty qualifying set ⇒ 0.5 neutral default, cached verbatim
//! - composed texts reaching the classifier (filler substitution, both-empty drop)
//! - classifier failure aborts the whole request and caches nothing
//! - TTL=0 entries treated as absent on the next call

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;

use news_sentiment_engine::cache::MemoryCache;
use news_sentiment_engine::classify::{ClassProbs, SentimentClassifier};
use news_sentiment_engine::engine::{CacheOutcome, SentimentEngine};
use news_sentiment_engine::news::{ArticleRecord, ArticleSource};

// --- mocks ---

struct FixedSource {
    articles: Vec<ArticleRecord>,
    calls: AtomicUsize,
}

impl FixedSource {
    fn new(articles: Vec<ArticleRecord>) -> Arc<Self> {
        Arc::new(Self {
            articles,
            calls: AtomicUsize::new(0),
        })
    }
    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArticleSource for FixedSource {
    async fn fetch(&self, _query: &str, _n: u32, _lookback_days: u32) -> Result<Vec<ArticleRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.articles.clone())
    }
    fn name(&self) -> &'static str {
        "fixed"
    }
}

/// Scores texts by keyword: "surge" is fully positive, "plunge" fully
/// negative, everything else neutral. Records every text it sees.
struct KeywordClassifier {
    calls: AtomicUsize,
    seen: Mutex<Vec<String>>,
    fail_on: Option<&'static str>,
}

impl KeywordClassifier {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
            fail_on: None,
        })
    }
    fn failing_on(word: &'static str) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
            fail_on: Some(word),
        })
    }
    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
    fn seen_texts(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl SentimentClassifier for KeywordClassifier {
    async fn classify(&self, text: &str) -> Result<ClassProbs> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(text.to_string());

        if let Some(word) = self.fail_on {
            if text.contains(word) {
                anyhow::bail!("classifier rejected input");
            }
        }

        let probs = if text.contains("surge") {
            ClassProbs { negative: 0.0, neutral: 0.0, positive: 1.0 }
        } else if text.contains("plunge") {
            ClassProbs { negative: 1.0, neutral: 0.0, positive: 0.0 }
        } else {
            ClassProbs { negative: 0.0, neutral: 1.0, positive: 0.0 }
        };
        Ok(probs)
    }
    fn name(&self) -> &'static str {
        "keyword"
    }
}

fn rec(title: Option<&str>, description: Option<&str>) -> ArticleRecord {
    ArticleRecord {
        title: title.map(str::to_string),
        description: description.map(str::to_string),
    }
}

fn engine_with(
    source: Arc<FixedSource>,
    classifier: Arc<KeywordClassifier>,
    ttl_secs: u64,
) -> SentimentEngine {
    SentimentEngine::new(source, classifier, Arc::new(MemoryCache::new()), ttl_secs)
}

// --- tests ---

#[tokio::test]
async fn second_call_is_a_pure_cache_hit() {
    let source = FixedSource::new(vec![
        rec(Some("Markets surge"), Some("Broad rally")),
        rec(Some("Quiet day"), Some("Little movement")),
    ]);
    let classifier = KeywordClassifier::new();
    let engine = engine_with(source.clone(), classifier.clone(), 3600);

    let first = engine.resolve("markets", 10, 7).await.unwrap();
    let second = engine.resolve("markets", 10, 7).await.unwrap();

    assert_eq!(first.outcome, CacheOutcome::Miss);
    assert_eq!(second.outcome, CacheOutcome::Hit);
    assert_eq!(first.score, second.score);
    assert_eq!(source.call_count(), 1, "second call must not refetch");
    assert_eq!(
        classifier.call_count(),
        2,
        "one classifier call per qualifying article, first request only"
    );
}

#[tokio::test]
async fn distinct_triples_are_cached_independently() {
    let source = FixedSource::new(vec![rec(Some("Quiet"), Some("Nothing new"))]);
    let classifier = KeywordClassifier::new();
    let engine = engine_with(source.clone(), classifier, 3600);

    engine.resolve("markets", 10, 7).await.unwrap();
    let other = engine.resolve("markets", 10, 14).await.unwrap();

    assert_eq!(other.outcome, CacheOutcome::Miss);
    assert_eq!(source.call_count(), 2);
}

#[tokio::test]
async fn empty_result_returns_and_caches_neutral_default() {
    let source = FixedSource::new(vec![rec(None, None), rec(Some(""), Some(""))]);
    let classifier = KeywordClassifier::new();
    let engine = engine_with(source.clone(), classifier.clone(), 3600);

    let first = engine.get_sentiment("ghost town", 10, 7).await.unwrap();
    assert_eq!(first, 0.5);
    assert_eq!(classifier.call_count(), 0, "dropped articles must not be scored");

    // The 0.5 default itself is cached: no second fetch within TTL.
    let second = engine.resolve("ghost town", 10, 7).await.unwrap();
    assert_eq!(second.score, 0.5);
    assert_eq!(second.outcome, CacheOutcome::Hit);
    assert_eq!(source.call_count(), 1);
}

#[tokio::test]
async fn composed_texts_reach_the_classifier() {
    let source = FixedSource::new(vec![
        rec(None, None),
        rec(Some("Up"), Some("Stocks rise")),
        rec(None, Some("Flat day")),
    ]);
    let classifier = KeywordClassifier::new();
    let engine = engine_with(source, classifier.clone(), 3600);

    engine.get_sentiment("stocks", 10, 7).await.unwrap();

    assert_eq!(
        classifier.seen_texts(),
        vec![
            "Stocks rise Up".to_string(),
            "Flat day confident.".to_string(),
        ]
    );
}

#[tokio::test]
async fn later_articles_dominate_the_aggregate() {
    // Source order: fully negative first, fully positive last. With
    // half-life 2 the last entry outweighs the first, so the aggregate
    // lands strictly above 0 (a plain mean would give exactly 0).
    let source = FixedSource::new(vec![
        rec(Some("Shares plunge"), Some("Rout deepens")),
        rec(Some("Shares surge"), Some("Rebound takes hold")),
    ]);
    let classifier = KeywordClassifier::new();
    let engine = engine_with(source, classifier, 3600);

    let score = engine.get_sentiment("shares", 10, 7).await.unwrap();
    assert!(score > 0.0, "got {score}");
    assert!(score <= 1.0);
}

#[tokio::test]
async fn classifier_failure_aborts_request_and_caches_nothing() {
    let source = FixedSource::new(vec![
        rec(Some("Fine"), Some("All good")),
        rec(Some("poison"), Some("Bad payload")),
    ]);
    let classifier = KeywordClassifier::failing_on("poison");
    let engine = engine_with(source.clone(), classifier, 3600);

    let err = engine.get_sentiment("mixed", 10, 7).await.unwrap_err();
    assert!(err.to_string().contains("classifying article"));

    // Nothing was cached, so a retry goes upstream again.
    let retry = engine.get_sentiment("mixed", 10, 7).await;
    assert!(retry.is_err());
    assert_eq!(source.call_count(), 2);
}

#[tokio::test]
async fn zero_ttl_entries_are_absent_on_the_next_call() {
    let source = FixedSource::new(vec![rec(Some("Quiet"), Some("Nothing new"))]);
    let classifier = KeywordClassifier::new();
    let engine = engine_with(source.clone(), classifier, 0);

    let first = engine.resolve("markets", 10, 7).await.unwrap();
    let second = engine.resolve("markets", 10, 7).await.unwrap();

    assert_eq!(first.outcome, CacheOutcome::Miss);
    assert_eq!(second.outcome, CacheOutcome::Miss, "ttl=0 must not serve hits");
    assert_eq!(source.call_count(), 2);
}

#[tokio::test]
async fn file_cache_survives_engine_restart() {
    let dir = tempfile::tempdir().unwrap();

    let source = FixedSource::new(vec![rec(Some("Quiet"), Some("Nothing new"))]);
    let classifier = KeywordClassifier::new();
    let engine = SentimentEngine::new(
        source.clone(),
        classifier.clone(),
        Arc::new(news_sentiment_engine::cache::FileCache::new(dir.path())),
        3600,
    );
    let first = engine.resolve("markets", 10, 7).await.unwrap();

    // A fresh engine over the same cache directory serves a hit.
    let source2 = FixedSource::new(vec![rec(Some("Quiet"), Some("Nothing new"))]);
    let engine2 = SentimentEngine::new(
        source2.clone(),
        KeywordClassifier::new(),
        Arc::new(news_sentiment_engine::cache::FileCache::new(dir.path())),
        3600,
    );
    let second = engine2.resolve("markets", 10, 7).await.unwrap();

    assert_eq!(second.outcome, CacheOutcome::Hit);
    assert_eq!(second.score, first.score);
    assert_eq!(source2.call_count(), 0);
}
