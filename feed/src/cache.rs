//! Quote cache decorator
//!
//! Wraps any `PriceFeed` and remembers the latest quote per symbol. A fresh
//! entry is served without touching the provider. When the provider fails,
//! the last known quote is returned regardless of age.

use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;
use pfm_risk::{PriceFeed, PricePoint, Result as RiskResult};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy)]
struct CachedQuote {
    price: f64,
    fetched_at: Instant,
}

/// Price feed with a TTL cache for latest quotes
pub struct CachedPriceFeed<F> {
    inner: F,
    ttl: Duration,
    quotes: DashMap<String, CachedQuote>,
}

impl<F: PriceFeed> CachedPriceFeed<F> {
    pub fn new(inner: F, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            quotes: DashMap::new(),
        }
    }

    pub fn inner(&self) -> &F {
        &self.inner
    }

    /// Cached quote regardless of age
    pub fn cached_quote(&self, symbol: &str) -> Option<f64> {
        self.quotes.get(symbol).map(|q| q.price)
    }

    pub fn invalidate(&self, symbol: &str) {
        self.quotes.remove(symbol);
    }

    pub fn clear(&self) {
        self.quotes.clear();
    }

    fn fresh_quote(&self, symbol: &str) -> Option<f64> {
        self.quotes
            .get(symbol)
            .filter(|q| q.fetched_at.elapsed() < self.ttl)
            .map(|q| q.price)
    }
}

#[async_trait]
impl<F: PriceFeed> PriceFeed for CachedPriceFeed<F> {
    async fn history(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> RiskResult<Vec<PricePoint>> {
        self.inner.history(symbol, start, end).await
    }

    async fn latest_price(&self, symbol: &str) -> RiskResult<Option<f64>> {
        if let Some(price) = self.fresh_quote(symbol) {
            debug!("Quote cache hit for {}", symbol);
            return Ok(Some(price));
        }

        match self.inner.latest_price(symbol).await {
            Ok(Some(price)) => {
                self.quotes.insert(
                    symbol.to_string(),
                    CachedQuote {
                        price,
                        fetched_at: Instant::now(),
                    },
                );
                Ok(Some(price))
            }
            Ok(None) => Ok(self.cached_quote(symbol)),
            Err(e) => match self.cached_quote(symbol) {
                Some(price) => {
                    warn!("Serving stale quote for {} after provider failure: {}", symbol, e);
                    Ok(Some(price))
                }
                None => Err(e),
            },
        }
    }
}
