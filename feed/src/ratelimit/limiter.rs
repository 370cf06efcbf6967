//! Token bucket rate limiter for provider requests

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter as GovRateLimiter};
use std::num::NonZeroU32;

use crate::error::{FeedError, FeedResult};

/// Rate limiter for API requests
pub struct RateLimiter {
    provider: String,
    limiter: DefaultDirectRateLimiter,
    requests_per_second: u32,
    burst_size: u32,
}

impl RateLimiter {
    /// Create a new rate limiter; both limits must be positive
    pub fn new(provider: impl Into<String>, requests_per_second: u32, burst_size: u32) -> FeedResult<Self> {
        let rate = NonZeroU32::new(requests_per_second).ok_or_else(|| {
            FeedError::ConfigError("requests_per_second must be positive".to_string())
        })?;
        let burst = NonZeroU32::new(burst_size)
            .ok_or_else(|| FeedError::ConfigError("burst_size must be positive".to_string()))?;

        Ok(Self {
            provider: provider.into(),
            limiter: GovRateLimiter::direct(Quota::per_second(rate).allow_burst(burst)),
            requests_per_second,
            burst_size,
        })
    }

    /// Wait until the bucket allows the next request
    pub async fn check(&self) {
        if self.limiter.check().is_err() {
            self.limiter.until_ready().await;
        }
    }

    /// Try to acquire permission without waiting
    pub fn try_check(&self) -> FeedResult<()> {
        self.limiter.check().map_err(|_| FeedError::RateLimitExceeded {
            provider: self.provider.clone(),
            message: format!(
                "Rate limit exceeded: {} requests/sec, burst {}",
                self.requests_per_second, self.burst_size
            ),
        })
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub fn requests_per_second(&self) -> u32 {
        self.requests_per_second
    }

    pub fn burst_size(&self) -> u32 {
        self.burst_size
    }
}
