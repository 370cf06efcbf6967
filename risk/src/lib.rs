//! # pfm-risk: Historical risk analytics for personal finance ledgers
//!
//! This library computes Value at Risk, expected shortfall and supporting
//! risk metrics for a portfolio of ledger positions, using daily closing
//! prices from a price feed.
//!
//! ## Core Components
//!
//! - **PortfolioAggregator**: Weighted daily portfolio value series
//! - **RiskEstimator**: Historical VaR/ES, volatility, Sharpe ratio, drawdown
//! - **ReportAssembler**: Monetary risk report for the current portfolio value
//! - **RiskService**: Ledger + price feed orchestration, price refresh
//! - **PriceRefreshScheduler**: Periodic price refresh in the background
//!
//! ## Example Usage
//!
//! ```rust
//! use pfm_risk::{historical_var, RiskEstimator};
//!
//! let returns: Vec<f64> = (0..60).map(|i| ((i % 7) as f64 - 3.0) / 100.0).collect();
//!
//! let var_95 = historical_var(&returns, 0.95).unwrap();
//! assert!(var_95 < 0.0);
//!
//! let estimate = RiskEstimator::default().estimate(&returns, &[0.95, 0.99]).unwrap();
//! assert_eq!(estimate.observations, 60);
//! assert!(estimate.tail_risk(0.99).unwrap().var <= var_95);
//! ```

pub mod aggregator;
pub mod config;
pub mod error;
pub mod estimator;
pub mod feed;
pub mod ledger;
pub mod report;
pub mod returns;
pub mod scheduler;
pub mod service;
pub mod types;
pub mod valuation;

pub use aggregator::PortfolioAggregator;
pub use config::{RiskConfig, WeightingScheme};
pub use error::{Result, RiskError};
pub use estimator::{
    expected_shortfall, historical_var, max_drawdown, percentile, RiskEstimate, RiskEstimator,
    RiskMetrics, TailRisk, PLACEHOLDER_BETA,
};
pub use feed::PriceFeed;
pub use ledger::LedgerStore;
pub use report::{LevelRisk, MonetaryRisk, ReportAssembler, ReportContext, ReportStatus, RiskReport};
pub use returns::{extract_returns, simple_returns, MIN_OBSERVATIONS};
pub use scheduler::PriceRefreshScheduler;
pub use service::{RefreshSummary, RiskRequest, RiskService};
pub use types::{InstrumentHistory, PortfolioPoint, Position, PricePoint};
pub use valuation::{HoldingValuation, PortfolioValuation};
