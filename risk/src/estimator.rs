//! Historical-simulation risk estimation
//!
//! Implements:
//! - Historical VaR: empirical percentile of returns with linear interpolation
//! - Expected Shortfall: mean of returns at or below VaR
//! - Volatility: sample standard deviation annualized by √252
//! - Sharpe Ratio: (mean × 252 - risk-free rate) / volatility
//! - Maximum Drawdown: largest peak-to-trough decline of the wealth index
//!
//! All figures are fractional returns. Losses are negative.

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::config::RiskConfig;
use crate::error::{Result, RiskError};
use crate::returns::ensure_observations;

/// Beta placeholder, no benchmark series is modelled
pub const PLACEHOLDER_BETA: f64 = 1.0;

/// VaR and ES at one confidence level, as fractional returns
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TailRisk {
    pub confidence_level: f64,
    pub var: f64,
    pub expected_shortfall: f64,
}

/// Distributional metrics of a return series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskMetrics {
    /// Annualized volatility
    pub volatility: f64,
    pub sharpe_ratio: f64,
    /// Absolute value of the worst drawdown, in [0, 1]
    pub max_drawdown: f64,
    /// Always 1.0; not a market-relative beta
    pub beta: f64,
}

/// Complete estimator output for one return series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskEstimate {
    /// One entry per requested confidence level, in request order
    pub tail_risks: Vec<TailRisk>,
    pub metrics: RiskMetrics,
    pub observations: usize,
}

impl RiskEstimate {
    /// Look up the tail risk for a confidence level
    pub fn tail_risk(&self, confidence_level: f64) -> Option<&TailRisk> {
        self.tail_risks
            .iter()
            .find(|t| t.confidence_level == confidence_level)
    }
}

/// Risk estimator over historical returns
#[derive(Debug, Clone)]
pub struct RiskEstimator {
    min_observations: usize,
    trading_days_per_year: f64,
    risk_free_rate: f64,
}

impl Default for RiskEstimator {
    fn default() -> Self {
        Self::new(&RiskConfig::default())
    }
}

impl RiskEstimator {
    pub fn new(config: &RiskConfig) -> Self {
        Self {
            min_observations: config.min_observations,
            trading_days_per_year: config.trading_days_per_year,
            risk_free_rate: config.risk_free_rate,
        }
    }

    /// Compute VaR/ES for each confidence level plus the auxiliary metrics.
    ///
    /// Duplicate levels are reported once.
    pub fn estimate(&self, returns: &[f64], confidence_levels: &[f64]) -> Result<RiskEstimate> {
        ensure_observations(returns, self.min_observations)?;
        for &level in confidence_levels {
            validate_confidence_level(level)?;
        }

        let sorted = sorted_returns(returns)?;

        let mut tail_risks: Vec<TailRisk> = Vec::with_capacity(confidence_levels.len());
        for &level in confidence_levels {
            if tail_risks.iter().any(|t| t.confidence_level == level) {
                continue;
            }
            let var = historical_var_sorted(&sorted, level);
            tail_risks.push(TailRisk {
                confidence_level: level,
                var,
                expected_shortfall: expected_shortfall_sorted(&sorted, var),
            });
        }

        Ok(RiskEstimate {
            tail_risks,
            metrics: self.metrics(returns),
            observations: returns.len(),
        })
    }

    /// Volatility, Sharpe ratio, maximum drawdown and beta
    pub fn metrics(&self, returns: &[f64]) -> RiskMetrics {
        let volatility = self.volatility(returns);
        RiskMetrics {
            volatility,
            sharpe_ratio: self.sharpe_ratio(returns, volatility),
            max_drawdown: max_drawdown(returns),
            beta: PLACEHOLDER_BETA,
        }
    }

    /// Sample standard deviation annualized by √(trading days)
    ///
    /// Exactly zero for fewer than two returns or a constant series.
    pub fn volatility(&self, returns: &[f64]) -> f64 {
        if returns.len() < 2 || is_constant(returns) {
            return 0.0;
        }
        returns.iter().std_dev() * self.trading_days_per_year.sqrt()
    }

    /// (annualized mean - risk-free rate) / volatility, 0 when volatility is 0
    pub fn sharpe_ratio(&self, returns: &[f64], volatility: f64) -> f64 {
        if volatility == 0.0 || returns.is_empty() {
            return 0.0;
        }
        let annual_return = returns.iter().mean() * self.trading_days_per_year;
        (annual_return - self.risk_free_rate) / volatility
    }
}

/// Historical VaR: the (1 - c) × 100-th percentile of returns
pub fn historical_var(returns: &[f64], confidence_level: f64) -> Result<f64> {
    validate_confidence_level(confidence_level)?;
    let sorted = sorted_returns(returns)?;
    Ok(historical_var_sorted(&sorted, confidence_level))
}

/// Mean of returns at or below VaR, VaR itself when that tail is empty
pub fn expected_shortfall(returns: &[f64], confidence_level: f64) -> Result<f64> {
    validate_confidence_level(confidence_level)?;
    let sorted = sorted_returns(returns)?;
    let var = historical_var_sorted(&sorted, confidence_level);
    Ok(expected_shortfall_sorted(&sorted, var))
}

/// Percentile of an ascending slice with linear interpolation between
/// order statistics. `percentile` is in [0, 100].
pub fn percentile(sorted: &[f64], percentile: f64) -> f64 {
    match sorted.len() {
        0 => return f64::NAN,
        1 => return sorted[0],
        _ => {}
    }

    let rank = (percentile / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;

    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

/// Largest peak-to-trough decline of W_t = Π(1 + r_i), as a positive fraction
pub fn max_drawdown(returns: &[f64]) -> f64 {
    let mut wealth = 1.0;
    let mut peak = f64::NEG_INFINITY;
    let mut worst = 0.0_f64;

    for r in returns {
        wealth *= 1.0 + r;
        if wealth > peak {
            peak = wealth;
        }
        if peak > 0.0 {
            let drawdown = (wealth - peak) / peak;
            if drawdown < worst {
                worst = drawdown;
            }
        }
    }

    worst.abs()
}

fn historical_var_sorted(sorted: &[f64], confidence_level: f64) -> f64 {
    percentile(sorted, (1.0 - confidence_level) * 100.0)
}

fn expected_shortfall_sorted(sorted: &[f64], var: f64) -> f64 {
    let tail: Vec<f64> = sorted.iter().copied().take_while(|&r| r <= var).collect();
    if tail.is_empty() {
        return var;
    }
    tail.iter().sum::<f64>() / tail.len() as f64
}

fn sorted_returns(returns: &[f64]) -> Result<Vec<f64>> {
    if returns.is_empty() {
        return Err(RiskError::InsufficientData {
            required: 1,
            available: 0,
        });
    }
    if returns.iter().any(|r| !r.is_finite()) {
        return Err(RiskError::InvalidParameter(
            "Return series contains non-finite values".to_string(),
        ));
    }

    let mut sorted = returns.to_vec();
    sorted.sort_by(f64::total_cmp);
    Ok(sorted)
}

fn is_constant(returns: &[f64]) -> bool {
    returns.windows(2).all(|w| w[0] == w[1])
}

pub(crate) fn validate_confidence_level(level: f64) -> Result<()> {
    if level > 0.0 && level < 1.0 {
        Ok(())
    } else {
        Err(RiskError::InvalidConfidenceLevel(level))
    }
}
