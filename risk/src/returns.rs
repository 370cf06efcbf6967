//! Return series extraction
//!
//! Turns an aggregated portfolio value series into period-over-period simple
//! returns: r_t = (V_t - V_{t-1}) / V_{t-1}

use crate::error::{Result, RiskError};
use crate::types::PortfolioPoint;

/// Minimum number of returns for a meaningful percentile estimate
pub const MIN_OBSERVATIONS: usize = 30;

/// Simple returns between consecutive values.
///
/// The first entry has no predecessor and is skipped. A step whose previous
/// value is zero has no defined return and is left out.
pub fn simple_returns(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .filter(|w| w[0] != 0.0)
        .map(|w| (w[1] - w[0]) / w[0])
        .collect()
}

/// Simple returns of a portfolio time series
pub fn period_returns(series: &[PortfolioPoint]) -> Vec<f64> {
    let values: Vec<f64> = series.iter().map(|p| p.portfolio_value).collect();
    simple_returns(&values)
}

/// Extract returns and require at least `min_observations` of them
pub fn extract_returns(series: &[PortfolioPoint], min_observations: usize) -> Result<Vec<f64>> {
    let returns = period_returns(series);
    ensure_observations(&returns, min_observations)?;
    Ok(returns)
}

/// Fail with `InsufficientData` when the sample is too small
pub fn ensure_observations(returns: &[f64], min_observations: usize) -> Result<()> {
    if returns.len() < min_observations {
        return Err(RiskError::InsufficientData {
            required: min_observations,
            available: returns.len(),
        });
    }
    Ok(())
}
