//! Sentiment classifier: trait + FinBERT-over-HTTP provider.
//!
//! The classifier is an opaque scoring function from text to a 3-class
//! probability distribution. Per-text results are never cached; only the
//! final aggregate is.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 3-class probability distribution over {negative, neutral, positive}.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassProbs {
    pub negative: f64,
    pub neutral: f64,
    pub positive: f64,
}

impl ClassProbs {
    /// Per-article sentiment score. Bounded to [-1, 1] for any valid
    /// distribution (entries non-negative, summing to 1).
    pub fn polarity(&self) -> f64 {
        self.positive - self.negative
    }

    /// Reject distributions a well-behaved classifier cannot produce.
    pub fn validate(&self) -> Result<()> {
        let sum = self.negative + self.neutral + self.positive;
        if self.negative < 0.0 || self.neutral < 0.0 || self.positive < 0.0 {
            anyhow::bail!("classifier returned a negative probability: {self:?}");
        }
        if !(0.99..=1.01).contains(&sum) {
            anyhow::bail!("classifier probabilities sum to {sum}, expected 1");
        }
        Ok(())
    }
}

/// Capability abstraction over the pretrained model so alternate providers
/// (mock, self-hosted) can be substituted without touching the engine.
#[async_trait]
pub trait SentimentClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<ClassProbs>;
    fn name(&self) -> &'static str;
}

// ------------------------------------------------------------
// FinBERT via the Hugging Face inference API
// ------------------------------------------------------------

const FINBERT_MODEL: &str = "yiyanghkust/finbert-tone";

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
}

#[derive(Debug, Deserialize)]
struct LabelScore {
    label: String,
    score: f64,
}

/// Hosted FinBERT classifier. The API token is injected explicitly;
/// construction never reads the process environment.
pub struct FinbertClassifier {
    http: reqwest::Client,
    api_token: String,
    endpoint: String,
}

impl FinbertClassifier {
    pub fn new(api_token: impl Into<String>) -> Self {
        Self::with_endpoint(
            api_token,
            format!("https://api-inference.huggingface.co/models/{FINBERT_MODEL}"),
        )
    }

    /// Point at a different inference endpoint (self-hosted, test server).
    pub fn with_endpoint(api_token: impl Into<String>, endpoint: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("news-sentiment-engine/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(30))
            .build()
            .expect("reqwest client");
        Self {
            http,
            api_token: api_token.into(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl SentimentClassifier for FinbertClassifier {
    async fn classify(&self, text: &str) -> Result<ClassProbs> {
        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_token)
            .json(&InferenceRequest { inputs: text })
            .send()
            .await
            .context("finbert inference request")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("finbert inference failed (http {status}): {body}");
        }

        // Text-classification responses arrive as [[{label, score}, ...]].
        let batches: Vec<Vec<LabelScore>> = resp
            .json()
            .await
            .context("decoding finbert inference response")?;
        let scores = batches
            .into_iter()
            .next()
            .context("finbert response contained no classification")?;

        let probs = probs_from_labels(&scores)?;
        probs.validate()?;
        Ok(probs)
    }

    fn name(&self) -> &'static str {
        "finbert"
    }
}

fn probs_from_labels(scores: &[LabelScore]) -> Result<ClassProbs> {
    let mut negative = None;
    let mut neutral = None;
    let mut positive = None;

    for ls in scores {
        match ls.label.to_ascii_lowercase().as_str() {
            "negative" => negative = Some(ls.score),
            "neutral" => neutral = Some(ls.score),
            "positive" => positive = Some(ls.score),
            other => anyhow::bail!("unexpected classifier label `{other}`"),
        }
    }

    Ok(ClassProbs {
        negative: negative.context("classifier response missing `negative`")?,
        neutral: neutral.context("classifier response missing `neutral`")?,
        positive: positive.context("classifier response missing `positive`")?,
    })
}
