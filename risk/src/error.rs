//! Error types for risk computation

use thiserror::Error;

/// Errors that can occur while building a risk report
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RiskError {
    #[error("No positions in ledger")]
    NoPositions,

    #[error("Insufficient data: need at least {required} return observations, got {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("Price feed unavailable for {symbol}: {reason}")]
    PriceFeedUnavailable { symbol: String, reason: String },

    #[error("Invalid confidence level: {0} (must be between 0 and 1)")]
    InvalidConfidenceLevel(f64),

    #[error("Invalid time horizon: {0} (must be positive)")]
    InvalidTimeHorizon(u32),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Ledger error: {0}")]
    Ledger(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl RiskError {
    /// True for the "not enough history" condition shown to users
    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, RiskError::InsufficientData { .. })
    }

    /// Price feed failures are recovered per instrument instead of failing the report
    pub fn is_recoverable(&self) -> bool {
        matches!(self, RiskError::PriceFeedUnavailable { .. })
    }
}

impl From<serde_yaml::Error> for RiskError {
    fn from(err: serde_yaml::Error) -> Self {
        RiskError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RiskError>;
