use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{FeedError, FeedResult};

/// Environment variable consulted for the provider API key
pub const API_KEY_ENV: &str = "PFM_FEED_API_KEY";

/// Price feed configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Base URL of the Yahoo Finance API (chart and search)
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Sent as `X-API-Key` when set (proxies and paid mirrors)
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,

    #[serde(default = "default_burst_size")]
    pub burst_size: u32,

    /// HTTP request timeout in seconds
    #[serde(default = "default_request_timeout_sec")]
    pub request_timeout_sec: u64,

    /// How long a cached quote counts as fresh, in seconds
    #[serde(default = "default_quote_cache_ttl_sec")]
    pub quote_cache_ttl_sec: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl FeedConfig {
    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_sec)
    }

    /// Get quote cache TTL as Duration
    pub fn quote_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.quote_cache_ttl_sec)
    }

    /// Load configuration from YAML string
    pub fn from_yaml(yaml: &str) -> FeedResult<Self> {
        let config: FeedConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Fill `api_key` from the environment when the config has none
    pub fn with_env_api_key(mut self) -> Self {
        if self.api_key.is_none() {
            self.api_key = std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty());
        }
        self
    }

    pub fn validate(&self) -> FeedResult<()> {
        url::Url::parse(&self.endpoint)?;
        if self.requests_per_second == 0 || self.burst_size == 0 {
            return Err(FeedError::ConfigError(
                "requests_per_second and burst_size must be positive".to_string(),
            ));
        }
        if self.request_timeout_sec == 0 {
            return Err(FeedError::ConfigError(
                "request_timeout_sec must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: None,
            requests_per_second: default_requests_per_second(),
            burst_size: default_burst_size(),
            request_timeout_sec: default_request_timeout_sec(),
            quote_cache_ttl_sec: default_quote_cache_ttl_sec(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_endpoint() -> String {
    "https://query1.finance.yahoo.com".to_string()
}

fn default_requests_per_second() -> u32 {
    5
}

fn default_burst_size() -> u32 {
    10
}

fn default_request_timeout_sec() -> u64 {
    10
}

fn default_quote_cache_ttl_sec() -> u64 {
    900
}

fn default_user_agent() -> String {
    concat!("pfm-risk/", env!("CARGO_PKG_VERSION")).to_string()
}
