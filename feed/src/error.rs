//! Error types for price feed adapters

use pfm_risk::RiskError;
use thiserror::Error;

/// Result type for price feed operations
pub type FeedResult<T> = Result<T, FeedError>;

/// Price feed error types
#[derive(Debug, Error)]
pub enum FeedError {
    /// Provider does not know the symbol
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// Provider returned an error payload
    #[error("Provider error for {symbol}: {message}")]
    Provider {
        /// Requested symbol
        symbol: String,
        /// Error message
        message: String,
        /// Optional error code from the provider
        code: Option<String>,
    },

    /// Rate limit exceeded
    #[error("Rate limit exceeded for {provider}: {message}")]
    RateLimitExceeded {
        /// Provider identifier
        provider: String,
        /// Error message
        message: String,
    },

    /// Invalid API response
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// JSON deserialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Malformed endpoint
    #[error("URL error: {0}")]
    UrlError(#[from] url::ParseError),
}

impl FeedError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            FeedError::RateLimitExceeded { .. } => true,
            FeedError::HttpError(e) => e.is_timeout() || e.is_connect(),
            FeedError::Provider { code: Some(code), .. } => code.starts_with('5'),
            _ => false,
        }
    }

    /// Check if the provider reported an unknown symbol
    pub fn is_not_found(&self) -> bool {
        matches!(self, FeedError::SymbolNotFound(_))
    }

    /// Convert into the risk core's per-instrument failure
    pub fn into_risk_error(self, symbol: &str) -> RiskError {
        RiskError::PriceFeedUnavailable {
            symbol: symbol.to_string(),
            reason: self.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for FeedError {
    fn from(err: serde_yaml::Error) -> Self {
        FeedError::ConfigError(err.to_string())
    }
}
