//! Article source: trait + NewsAPI provider.
//!
//! The engine only sees [`ArticleSource`]; the concrete provider talks to
//! newsapi.org and normalizes text fields on ingest so downstream
//! composition works on clean plain text.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Days, Utc};
use metrics::{counter, histogram};
use serde::Deserialize;
use std::time::Duration;

/// One raw article as the engine consumes it. Either field may be absent;
/// records where both are absent carry no signal and are dropped later.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ArticleRecord {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Provider abstraction so alternate backends (mock, different vendor) can
/// be substituted without touching the engine.
#[async_trait]
pub trait ArticleSource: Send + Sync {
    /// Fetch up to `n` articles matching `query`, published within the last
    /// `lookback_days` days. The returned order is the provider's contract
    /// and feeds directly into the decay weighting.
    async fn fetch(&self, query: &str, n: u32, lookback_days: u32) -> Result<Vec<ArticleRecord>>;
    fn name(&self) -> &'static str;
}

// ------------------------------------------------------------
// NewsAPI provider
// ------------------------------------------------------------

const NEWSAPI_EVERYTHING_URL: &str = "https://newsapi.org/v2/everything";

#[derive(Debug, Deserialize)]
struct NewsApiResponse {
    status: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<RawArticle>,
}

#[derive(Debug, Deserialize)]
struct RawArticle {
    title: Option<String>,
    description: Option<String>,
}

/// newsapi.org `/v2/everything` client. The API key is injected explicitly;
/// construction never reads the process environment.
pub struct NewsApiSource {
    http: reqwest::Client,
    api_key: String,
}

impl NewsApiSource {
    pub fn new(api_key: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("news-sentiment-engine/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(10))
            .build()
            .expect("reqwest client");
        Self {
            http,
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl ArticleSource for NewsApiSource {
    async fn fetch(&self, query: &str, n: u32, lookback_days: u32) -> Result<Vec<ArticleRecord>> {
        let t0 = std::time::Instant::now();

        let from = Utc::now()
            .date_naive()
            .checked_sub_days(Days::new(lookback_days as u64))
            .unwrap_or_else(|| Utc::now().date_naive())
            .format("%Y-%m-%d")
            .to_string();

        let page_size = n.to_string();
        let resp = self
            .http
            .get(NEWSAPI_EVERYTHING_URL)
            .header("X-Api-Key", &self.api_key)
            .query(&[
                ("q", query),
                ("from", from.as_str()),
                ("language", "en"),
                ("sortBy", "publishedAt"),
                ("pageSize", page_size.as_str()),
            ])
            .send()
            .await
            .with_context(|| format!("newsapi request for query `{query}`"))?;

        let status = resp.status();
        let body: NewsApiResponse = resp
            .json()
            .await
            .with_context(|| format!("decoding newsapi response (http {status})"))?;

        if body.status != "ok" {
            counter!("news_fetch_errors_total").increment(1);
            anyhow::bail!(
                "newsapi error for query `{}`: {} ({})",
                query,
                body.message.unwrap_or_else(|| "unknown".into()),
                body.code.unwrap_or_else(|| status.to_string()),
            );
        }

        let out: Vec<ArticleRecord> = body
            .articles
            .into_iter()
            .map(|a| ArticleRecord {
                title: clean_field(a.title),
                description: clean_field(a.description),
            })
            .collect();

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("news_fetch_ms").record(ms);
        counter!("news_articles_total").increment(out.len() as u64);
        tracing::debug!(query, n, lookback_days, fetched = out.len(), "newsapi fetch");

        Ok(out)
    }

    fn name(&self) -> &'static str {
        "newsapi"
    }
}

/// Normalize an optional text field; fields that normalize to nothing
/// become `None` so the filtering rules see them as absent.
fn clean_field(field: Option<String>) -> Option<String> {
    let cleaned = normalize_text(field.as_deref()?);
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Normalize provider text: HTML entity decode, tag strip, whitespace
/// collapse, trim. NewsAPI descriptions occasionally carry markup fragments.
pub fn normalize_text(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    static RE_WS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();

    out.trim().to_string()
}
