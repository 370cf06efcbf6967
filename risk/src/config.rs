//! Risk computation configuration loaded from YAML

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Result, RiskError};

/// How static position weights are derived for historical aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightingScheme {
    /// quantity × acquisition price (buy-and-hold)
    #[default]
    AcquisitionValue,

    /// quantity × current price, acquisition price when unpriced
    CurrentValue,
}

/// Risk computation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Minimum number of aligned daily returns
    #[serde(default = "default_min_observations")]
    pub min_observations: usize,

    /// Annualization factor (trading days per year)
    #[serde(default = "default_trading_days_per_year")]
    pub trading_days_per_year: f64,

    /// Annual risk-free rate used by the Sharpe ratio
    #[serde(default = "default_risk_free_rate")]
    pub risk_free_rate: f64,

    /// Confidence levels used when a request names none
    #[serde(default = "default_confidence_levels")]
    pub default_confidence_levels: Vec<f64>,

    /// Default lookback window in calendar days
    #[serde(default = "default_lookback_days")]
    pub default_lookback_days: u32,

    /// Largest lookback window a request may ask for, in calendar days
    #[serde(default = "default_max_lookback_days")]
    pub max_lookback_days: u32,

    /// Extra calendar days fetched before the lookback window
    #[serde(default = "default_lookback_padding_days")]
    pub lookback_padding_days: u32,

    /// Per-instrument fetch timeout in milliseconds
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,

    /// Maximum number of concurrent price feed requests
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,

    /// Nominal value reported when the portfolio is worth exactly zero
    #[serde(default = "default_placeholder_value")]
    pub placeholder_value: f64,

    #[serde(default)]
    pub weighting: WeightingScheme,
}

impl RiskConfig {
    /// Get fetch timeout as Duration
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    /// Load configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: RiskConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| RiskError::Config(e.to_string()))?;
        Self::from_yaml(&contents)
    }

    /// Reject values the estimator cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.min_observations < 2 {
            return Err(RiskError::Config(format!(
                "min_observations must be at least 2, got {}",
                self.min_observations
            )));
        }
        if !(self.trading_days_per_year > 0.0) {
            return Err(RiskError::Config(format!(
                "trading_days_per_year must be positive, got {}",
                self.trading_days_per_year
            )));
        }
        if self.max_lookback_days == 0 || self.max_lookback_days > MAX_LOOKBACK_LIMIT {
            return Err(RiskError::Config(format!(
                "max_lookback_days must be in 1..={}, got {}",
                MAX_LOOKBACK_LIMIT, self.max_lookback_days
            )));
        }
        if self.default_lookback_days == 0 || self.default_lookback_days > self.max_lookback_days {
            return Err(RiskError::Config(format!(
                "default_lookback_days must be in 1..={}, got {}",
                self.max_lookback_days, self.default_lookback_days
            )));
        }
        if self.lookback_padding_days > MAX_LOOKBACK_LIMIT {
            return Err(RiskError::Config(format!(
                "lookback_padding_days must be at most {}, got {}",
                MAX_LOOKBACK_LIMIT, self.lookback_padding_days
            )));
        }
        if self.max_concurrent_fetches == 0 {
            return Err(RiskError::Config(
                "max_concurrent_fetches must be positive".to_string(),
            ));
        }
        if !(self.placeholder_value > 0.0) {
            return Err(RiskError::Config(format!(
                "placeholder_value must be positive, got {}",
                self.placeholder_value
            )));
        }
        for &level in &self.default_confidence_levels {
            if !(level > 0.0 && level < 1.0) {
                return Err(RiskError::InvalidConfidenceLevel(level));
            }
        }
        Ok(())
    }
}

/// Hard ceiling for configured windows (about 100 years)
pub const MAX_LOOKBACK_LIMIT: u32 = 36_500;

// Default value functions
fn default_min_observations() -> usize {
    30
}

fn default_trading_days_per_year() -> f64 {
    252.0
}

fn default_risk_free_rate() -> f64 {
    0.02
}

fn default_confidence_levels() -> Vec<f64> {
    vec![0.95, 0.99]
}

fn default_lookback_days() -> u32 {
    252
}

fn default_max_lookback_days() -> u32 {
    3_650
}

fn default_lookback_padding_days() -> u32 {
    30
}

fn default_fetch_timeout_ms() -> u64 {
    10_000
}

fn default_max_concurrent_fetches() -> usize {
    8
}

fn default_placeholder_value() -> f64 {
    10_000.0
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            min_observations: default_min_observations(),
            trading_days_per_year: default_trading_days_per_year(),
            risk_free_rate: default_risk_free_rate(),
            default_confidence_levels: default_confidence_levels(),
            default_lookback_days: default_lookback_days(),
            max_lookback_days: default_max_lookback_days(),
            lookback_padding_days: default_lookback_padding_days(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
            max_concurrent_fetches: default_max_concurrent_fetches(),
            placeholder_value: default_placeholder_value(),
            weighting: WeightingScheme::default(),
        }
    }
}
