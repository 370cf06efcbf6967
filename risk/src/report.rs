//! Risk report assembly
//!
//! Converts fractional estimator output into monetary figures. Every amount
//! in a report is `fraction × current_value`; `MonetaryRisk` can only be
//! built that way.

use chrono::NaiveDate;
use serde::Serialize;

use crate::estimator::{RiskEstimate, RiskMetrics, TailRisk};
use crate::types::Position;
use crate::valuation::portfolio_value;

/// Whether the report carries real figures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    /// Computed from positions and price history
    Complete,

    /// Empty portfolio: nominal value, no levels, no metrics
    Placeholder,
}

/// A fractional return and its monetary equivalent
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonetaryRisk {
    fraction: f64,
    amount: f64,
}

impl MonetaryRisk {
    fn from_fraction(fraction: f64, current_value: f64) -> Self {
        Self {
            fraction,
            amount: fraction * current_value,
        }
    }

    /// Fractional return (negative values are losses)
    pub fn fraction(&self) -> f64 {
        self.fraction
    }

    /// Amount in currency units
    pub fn amount(&self) -> f64 {
        self.amount
    }
}

/// VaR and ES at one confidence level
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelRisk {
    pub confidence_level: f64,
    pub var: MonetaryRisk,
    pub expected_shortfall: MonetaryRisk,
}

impl LevelRisk {
    fn from_tail(tail: &TailRisk, current_value: f64) -> Self {
        Self {
            confidence_level: tail.confidence_level,
            var: MonetaryRisk::from_fraction(tail.var, current_value),
            expected_shortfall: MonetaryRisk::from_fraction(tail.expected_shortfall, current_value),
        }
    }
}

/// Request parameters echoed in the report
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportContext {
    pub time_horizon_days: u32,
    pub lookback_days: u32,
    pub as_of: NaiveDate,
}

/// Caller-facing risk report
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskReport {
    pub status: ReportStatus,
    pub levels: Vec<LevelRisk>,
    pub metrics: Option<RiskMetrics>,
    pub confidence_levels: Vec<f64>,
    pub time_horizon_days: u32,
    pub lookback_days: u32,
    pub as_of: NaiveDate,
    /// Portfolio value used for every monetary figure
    pub current_value: f64,
    /// Number of aligned daily returns behind the estimate
    pub observations: usize,
}

impl RiskReport {
    pub fn is_placeholder(&self) -> bool {
        self.status == ReportStatus::Placeholder
    }

    /// Look up VaR/ES for a confidence level
    pub fn level(&self, confidence_level: f64) -> Option<&LevelRisk> {
        self.levels
            .iter()
            .find(|l| l.confidence_level == confidence_level)
    }
}

/// Builds reports from estimator output and ledger positions
#[derive(Debug, Clone)]
pub struct ReportAssembler {
    placeholder_value: f64,
}

impl ReportAssembler {
    pub fn new(placeholder_value: f64) -> Self {
        Self { placeholder_value }
    }

    /// Current portfolio value, substituting the nominal value for exactly zero
    pub fn current_value(&self, positions: &[Position]) -> f64 {
        let value = portfolio_value(positions);
        if value == 0.0 {
            self.placeholder_value
        } else {
            value
        }
    }

    pub fn assemble(
        &self,
        estimate: &RiskEstimate,
        positions: &[Position],
        context: ReportContext,
    ) -> RiskReport {
        let current_value = self.current_value(positions);

        RiskReport {
            status: ReportStatus::Complete,
            levels: estimate
                .tail_risks
                .iter()
                .map(|t| LevelRisk::from_tail(t, current_value))
                .collect(),
            metrics: Some(estimate.metrics),
            confidence_levels: estimate
                .tail_risks
                .iter()
                .map(|t| t.confidence_level)
                .collect(),
            time_horizon_days: context.time_horizon_days,
            lookback_days: context.lookback_days,
            as_of: context.as_of,
            current_value,
            observations: estimate.observations,
        }
    }

    /// Report for an empty portfolio
    pub fn placeholder(&self, confidence_levels: &[f64], context: ReportContext) -> RiskReport {
        RiskReport {
            status: ReportStatus::Placeholder,
            levels: Vec::new(),
            metrics: None,
            confidence_levels: confidence_levels.to_vec(),
            time_horizon_days: context.time_horizon_days,
            lookback_days: context.lookback_days,
            as_of: context.as_of,
            current_value: self.placeholder_value,
            observations: 0,
        }
    }
}

impl Default for ReportAssembler {
    fn default() -> Self {
        Self::new(10_000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> ReportContext {
        ReportContext {
            time_horizon_days: 1,
            lookback_days: 252,
            as_of: NaiveDate::from_ymd_opt(2024, 6, 28).unwrap(),
        }
    }

    fn estimate() -> RiskEstimate {
        RiskEstimate {
            tail_risks: vec![
                TailRisk {
                    confidence_level: 0.95,
                    var: -0.02,
                    expected_shortfall: -0.03,
                },
                TailRisk {
                    confidence_level: 0.99,
                    var: -0.04,
                    expected_shortfall: -0.05,
                },
            ],
            metrics: RiskMetrics {
                volatility: 0.18,
                sharpe_ratio: 0.9,
                max_drawdown: 0.12,
                beta: 1.0,
            },
            observations: 251,
        }
    }

    #[test]
    fn test_amounts_are_fraction_times_value() {
        let positions = vec![
            Position::new("AAPL", 10.0, 150.0).with_current_price(200.0),
            Position::new("VWCE", 30.0, 100.0),
        ];
        let report = ReportAssembler::default().assemble(&estimate(), &positions, context());

        assert_eq!(report.status, ReportStatus::Complete);
        assert_eq!(report.current_value, 5000.0);
        assert_eq!(report.confidence_levels, vec![0.95, 0.99]);
        for level in &report.levels {
            assert_eq!(level.var.amount(), level.var.fraction() * report.current_value);
            assert_eq!(
                level.expected_shortfall.amount(),
                level.expected_shortfall.fraction() * report.current_value
            );
        }

        let l95 = report.level(0.95).unwrap();
        assert_eq!(l95.var.amount(), -0.02 * 5000.0);
        assert_eq!(l95.expected_shortfall.amount(), -0.03 * 5000.0);
        assert_eq!(report.observations, 251);
    }

    #[test]
    fn test_zero_value_uses_placeholder_value() {
        let positions = vec![Position::new("AAPL", 0.0, 150.0)];
        let assembler = ReportAssembler::default();
        assert_eq!(assembler.current_value(&positions), 10_000.0);

        let report = assembler.assemble(&estimate(), &positions, context());
        assert_eq!(report.current_value, 10_000.0);
        assert_eq!(report.level(0.99).unwrap().var.amount(), -0.04 * 10_000.0);
    }

    #[test]
    fn test_placeholder_report() {
        let report = ReportAssembler::default().placeholder(&[0.95], context());
        assert!(report.is_placeholder());
        assert_eq!(report.current_value, 10_000.0);
        assert!(report.levels.is_empty());
        assert!(report.metrics.is_none());
        assert_eq!(report.observations, 0);
    }

    #[test]
    fn test_report_serializes_camel_case() {
        let report = ReportAssembler::default().assemble(&estimate(), &[], context());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "complete");
        assert_eq!(json["currentValue"], 10_000.0);
        assert_eq!(json["timeHorizonDays"], 1);
        assert_eq!(json["levels"][0]["confidenceLevel"], 0.95);
        assert_eq!(json["levels"][0]["var"]["amount"], -200.0);
    }
}
