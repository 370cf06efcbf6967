//! Price feed trait
//!
//! A price feed returns daily closing prices per instrument symbol. Failures
//! are reported as `RiskError::PriceFeedUnavailable` and are treated by the
//! risk service as absence of data for that instrument.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::Result;
use crate::types::PricePoint;

/// Price feed interface
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Daily closes in `[start, end]`, ascending by date. May be empty.
    async fn history(&self, symbol: &str, start: NaiveDate, end: NaiveDate)
        -> Result<Vec<PricePoint>>;

    /// Latest available price, None if the provider has no quote
    async fn latest_price(&self, symbol: &str) -> Result<Option<f64>>;
}
