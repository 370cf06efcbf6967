//! Investment ledger storage for pfm-risk
//!
//! This module provides the ledger the risk service reads positions from:
//! an insertion-ordered in-memory store of investments with optional YAML
//! or JSON snapshot persistence.
//!
//! # Example
//!
//! ```no_run
//! use chrono::NaiveDate;
//! use pfm_storage::{MemoryLedger, NewInvestment, StorageConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = StorageConfig::from_yaml("seed_file: ledger.yaml\nautosave: true")?;
//!     let ledger = MemoryLedger::open(config).await?;
//!
//!     let bought = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap_or_default();
//!     ledger
//!         .create(NewInvestment::new("AAPL", 10.0, 150.0, bought).with_name("Apple Inc."))
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod types;

pub use config::StorageConfig;
pub use engine::MemoryLedger;
pub use error::{Result, StorageError};
pub use types::{Investment, InvestmentKind, InvestmentUpdate, LedgerSnapshot, NewInvestment};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
