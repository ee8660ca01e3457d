//! Client configuration.
//!
//! Values come from the process environment (optionally seeded from a `.env`
//! file by the binary) with defaults matching a local backend.

use std::time::Duration;

use tracing::debug;

use crate::error::{ApiError, Result};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_AUTOCOMPLETE_DEBOUNCE_MS: u64 = 300;

/// Connection settings for the portal backend.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend origin, without a trailing slash.
    pub base_url: String,
    /// Bearer token restored from a previous session.
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Quiet period before an autocomplete lookup is sent.
    pub autocomplete_debounce: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: trim_base_url(base_url.into()),
            access_token: None,
            refresh_token: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            autocomplete_debounce: Duration::from_millis(DEFAULT_AUTOCOMPLETE_DEBOUNCE_MS),
        }
    }

    /// Read configuration from `DEVPORT_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup (the environment, a map in tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let base_url = lookup("DEVPORT_API_BASE_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let mut config = Self::new(base_url);
        config.access_token = lookup("DEVPORT_ACCESS_TOKEN").filter(|v| !v.is_empty());
        config.refresh_token = lookup("DEVPORT_REFRESH_TOKEN").filter(|v| !v.is_empty());

        if let Some(raw) = lookup("DEVPORT_HTTP_TIMEOUT_SECS") {
            config.timeout = Duration::from_secs(parse_u64("DEVPORT_HTTP_TIMEOUT_SECS", &raw)?);
        }
        if let Some(raw) = lookup("DEVPORT_AUTOCOMPLETE_DEBOUNCE_MS") {
            config.autocomplete_debounce =
                Duration::from_millis(parse_u64("DEVPORT_AUTOCOMPLETE_DEBOUNCE_MS", &raw)?);
        }

        if !config.base_url.starts_with("http://") && !config.base_url.starts_with("https://") {
            return Err(ApiError::Config {
                details: format!("DEVPORT_API_BASE_URL must be an http(s) URL, got {:?}", config.base_url),
            });
        }

        debug!(
            "Loaded client config: base_url={} authenticated={}",
            config.base_url,
            config.access_token.is_some()
        );
        Ok(config)
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

fn trim_base_url(url: String) -> String {
    url.trim().trim_end_matches('/').to_string()
}

fn parse_u64(key: &str, raw: &str) -> Result<u64> {
    raw.trim().parse().map_err(|_| ApiError::Config {
        details: format!("{} must be a non-negative integer, got {:?}", key, raw),
    })
}
