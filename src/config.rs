//! Runtime settings. Credentials are carried explicitly in [`Settings`] and
//! injected into constructors; nothing downstream reads the process
//! environment. A missing NewsAPI key fails startup, never a request.

use anyhow::{Context, Result};

pub const ENV_NEWS_API_KEY: &str = "NEWS_API_KEY";
pub const ENV_HF_API_TOKEN: &str = "HF_API_TOKEN";
pub const ENV_CACHE_DIR: &str = "SENTIMENT_CACHE_DIR";
pub const ENV_CACHE_TTL_SECS: &str = "SENTIMENT_CACHE_TTL_SECS";

pub const DEFAULT_CACHE_DIR: &str = "cache/sentiment";

#[derive(Debug, Clone)]
pub struct Settings {
    /// NewsAPI credential. Required; absence is a fatal configuration error.
    pub news_api_key: String,
    /// Hugging Face inference token. The hosted endpoint rejects anonymous
    /// traffic, so this is required too.
    pub hf_api_token: String,
    pub cache_dir: String,
    pub cache_ttl_secs: u64,
}

impl Settings {
    /// Load from the process environment. `dotenvy::dotenv()` should run
    /// before this in local/dev (see `main.rs`, teacher idiom).
    pub fn from_env() -> Result<Self> {
        let news_api_key = std::env::var(ENV_NEWS_API_KEY)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .with_context(|| format!("{ENV_NEWS_API_KEY} not set"))?;
        let hf_api_token = std::env::var(ENV_HF_API_TOKEN)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .with_context(|| format!("{ENV_HF_API_TOKEN} not set"))?;

        let cache_dir = std::env::var(ENV_CACHE_DIR)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CACHE_DIR.to_string());
        let cache_ttl_secs = std::env::var(ENV_CACHE_TTL_SECS)
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(crate::cache::DEFAULT_TTL_SECS);

        Ok(Self {
            news_api_key,
            hf_api_token,
            cache_dir,
            cache_ttl_secs,
        })
    }
}
