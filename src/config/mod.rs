//! Application configuration

pub mod prompts;

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Placeholder value shipped in .env.example; treated the same as no key.
pub const API_KEY_PLACEHOLDER: &str = "your-deepseek-api-key";

const DEFAULT_API_URL: &str = "https://api.deepseek.com/v1/chat/completions";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// DeepSeek API key; the relay degrades gracefully when absent.
    pub api_key: Option<String>,
    /// Chat completions endpoint, overridable for compatible providers.
    pub api_url: String,
    /// Path to the resume text that seeds the public session.
    pub resume_file: String,
    /// Static secret guarding resume uploads; uploads are disabled when unset.
    pub secret_key: Option<String>,
    /// Buffered-path retry attempts on transient provider failure.
    pub retry_attempts: u32,
    /// Base backoff delay; doubles per attempt.
    pub retry_base: Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".into()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5000),
            api_key: env::var("DEEPSEEK_API_KEY").ok().filter(|k| !k.is_empty()),
            api_url: env::var("DEEPSEEK_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.into()),
            resume_file: env::var("RESUME_FILE").unwrap_or_else(|_| "content/resume.txt".into()),
            secret_key: env::var("SECRET_KEY").ok().filter(|k| !k.is_empty()),
            retry_attempts: 3,
            retry_base: Duration::from_secs(2),
        })
    }

    /// True when a usable (non-placeholder) API key is present.
    pub fn api_configured(&self) -> bool {
        self.api_key
            .as_deref()
            .is_some_and(|k| k != API_KEY_PLACEHOLDER)
    }
}
