//! Core data types shared by the risk pipeline

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An owned quantity of an instrument, as read from the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Ledger record identifier
    pub id: Uuid,

    /// Instrument symbol (e.g., "AAPL", "BTC-USD")
    pub symbol: String,

    /// Held quantity (non-negative)
    pub quantity: f64,

    /// Price paid per unit
    pub acquisition_price: f64,

    /// Last known market price, absent if never priced
    #[serde(default)]
    pub current_price: Option<f64>,
}

impl Position {
    pub fn new(symbol: impl Into<String>, quantity: f64, acquisition_price: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            symbol: symbol.into(),
            quantity,
            acquisition_price,
            current_price: None,
        }
    }

    pub fn with_current_price(mut self, price: f64) -> Self {
        self.current_price = Some(price);
        self
    }

    /// Price used wherever a value is needed: current price, else acquisition price
    pub fn valuation_price(&self) -> f64 {
        self.current_price.unwrap_or(self.acquisition_price)
    }

    /// Market value, falling back to acquisition price when unpriced
    pub fn market_value(&self) -> f64 {
        self.quantity * self.valuation_price()
    }

    /// Static buy-and-hold value weight
    pub fn cost_basis(&self) -> f64 {
        self.quantity * self.acquisition_price
    }
}

/// A single closing price for one instrument on one calendar date
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }

    /// Usable for valuation: finite and strictly positive
    pub fn is_valid(&self) -> bool {
        self.close.is_finite() && self.close > 0.0
    }
}

/// Price history of one instrument together with its portfolio weight
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentHistory {
    pub symbol: String,

    /// Un-normalized weight (e.g., quantity × acquisition price)
    pub weight: f64,

    /// Closing prices, ascending by date
    pub points: Vec<PricePoint>,
}

impl InstrumentHistory {
    pub fn new(symbol: impl Into<String>, weight: f64, points: Vec<PricePoint>) -> Self {
        Self {
            symbol: symbol.into(),
            weight,
            points,
        }
    }
}

/// One entry of the aggregated portfolio time series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioPoint {
    pub date: NaiveDate,

    /// Weighted portfolio value on this date
    pub portfolio_value: f64,

    /// Return versus the previous entry (0 for the first entry)
    pub period_return: f64,

    /// Return versus the first entry (0 for the first entry)
    pub cumulative_return: f64,
}
