use anyhow::{Context, Result};

use crate::query::resolver::ResolverBackend;

const DEFAULT_COMPLETION_API_URL: &str = "https://api.perplexity.ai/chat/completions";
const DEFAULT_COMPLETION_MODEL: &str = "llama-3.1-sonar-small-128k-online";

/// Application configuration loaded from environment variables.
/// Every variable has a default; invalid values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// JSON employee feed. The embedded sample is used when unset.
    pub dataset_path: Option<String>,
    pub completion_api_url: String,
    pub completion_model: String,
    pub completion_timeout_secs: u64,
    /// Resolver used when a query does not name one.
    pub default_backend: ResolverBackend,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            dataset_path: optional_env("DATASET_PATH"),
            completion_api_url: env_or("COMPLETION_API_URL", DEFAULT_COMPLETION_API_URL),
            completion_model: env_or("COMPLETION_MODEL", DEFAULT_COMPLETION_MODEL),
            completion_timeout_secs: env_or("COMPLETION_TIMEOUT_SECS", "60")
                .parse::<u64>()
                .context("COMPLETION_TIMEOUT_SECS must be a whole number of seconds")?,
            default_backend: env_or("QUERY_BACKEND", "local")
                .parse::<ResolverBackend>()
                .context("QUERY_BACKEND must be 'local' or 'llm'")?,
            port: env_or("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    optional_env(key).unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
impl Config {
    /// Defaults without touching the process environment.
    pub fn for_tests() -> Self {
        Config {
            dataset_path: None,
            completion_api_url: DEFAULT_COMPLETION_API_URL.to_string(),
            completion_model: "test-model".to_string(),
            completion_timeout_secs: 5,
            default_backend: ResolverBackend::Local,
            port: 0,
            rust_log: "debug".to_string(),
        }
    }
}
