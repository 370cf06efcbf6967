//! Portfolio time-series aggregation
//!
//! Combines independently dated instrument histories into one weighted
//! portfolio value series:
//! - Weights are static (fixed per call, not re-priced per day)
//! - Only dates where every included instrument has a valid price are kept
//! - The most recent `days` dates of the union of all histories are considered

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use tracing::debug;

use crate::types::{InstrumentHistory, PortfolioPoint};

/// Builds the portfolio value series from weighted instrument histories
#[derive(Debug, Clone, Default)]
pub struct PortfolioAggregator;

/// Instrument prepared for aggregation: normalized weight and date lookup
struct WeightedPrices<'a> {
    symbol: &'a str,
    weight: f64,
    prices: HashMap<NaiveDate, f64>,
}

impl PortfolioAggregator {
    pub fn new() -> Self {
        Self
    }

    /// Aggregate histories into a portfolio time series over the last `days` dates.
    ///
    /// Instruments with a non-positive weight or no valid price are excluded.
    /// The result is empty when nothing remains or no date has full coverage.
    pub fn aggregate(&self, histories: &[InstrumentHistory], days: usize) -> Vec<PortfolioPoint> {
        let instruments = Self::prepare(histories);
        if instruments.is_empty() || days == 0 {
            return Vec::new();
        }

        let all_dates: BTreeSet<NaiveDate> = instruments
            .iter()
            .flat_map(|inst| inst.prices.keys().copied())
            .collect();
        let skip = all_dates.len().saturating_sub(days);

        let mut values: Vec<(NaiveDate, f64)> = Vec::with_capacity(all_dates.len() - skip);
        let mut dropped = 0usize;

        for date in all_dates.into_iter().skip(skip) {
            match Self::value_on(&instruments, &date) {
                Some(value) => values.push((date, value)),
                None => dropped += 1,
            }
        }

        if dropped > 0 {
            debug!(
                "Dropped {} dates without full coverage across {} instruments",
                dropped,
                instruments.len()
            );
        }

        Self::with_returns(values)
    }

    /// Normalize weights over the instruments that actually have data
    fn prepare(histories: &[InstrumentHistory]) -> Vec<WeightedPrices<'_>> {
        let usable: Vec<(&InstrumentHistory, HashMap<NaiveDate, f64>)> = histories
            .iter()
            .filter(|h| h.weight.is_finite() && h.weight > 0.0)
            .map(|h| {
                let prices: HashMap<NaiveDate, f64> = h
                    .points
                    .iter()
                    .filter(|p| p.is_valid())
                    .map(|p| (p.date, p.close))
                    .collect();
                (h, prices)
            })
            .filter(|(_, prices)| !prices.is_empty())
            .collect();

        let total_weight: f64 = usable.iter().map(|(h, _)| h.weight).sum();
        if !(total_weight > 0.0) {
            return Vec::new();
        }

        usable
            .into_iter()
            .map(|(h, prices)| WeightedPrices {
                symbol: &h.symbol,
                weight: h.weight / total_weight,
                prices,
            })
            .collect()
    }

    /// Weighted value on a date, None if any instrument lacks a price
    fn value_on(instruments: &[WeightedPrices<'_>], date: &NaiveDate) -> Option<f64> {
        let mut value = 0.0;
        for inst in instruments {
            let price = inst.prices.get(date)?;
            value += price * inst.weight;
        }
        Some(value)
    }

    fn with_returns(values: Vec<(NaiveDate, f64)>) -> Vec<PortfolioPoint> {
        let Some(&(_, base)) = values.first() else {
            return Vec::new();
        };

        let mut series = Vec::with_capacity(values.len());
        let mut previous: Option<f64> = None;

        for (date, value) in values {
            let period_return = match previous {
                Some(prev) if prev != 0.0 => (value - prev) / prev,
                _ => 0.0,
            };
            let cumulative_return = if previous.is_some() && base != 0.0 {
                (value - base) / base
            } else {
                0.0
            };

            series.push(PortfolioPoint {
                date,
                portfolio_value: value,
                period_return,
                cumulative_return,
            });
            previous = Some(value);
        }

        series
    }

    /// Symbols that take part in the weighted computation
    pub fn included_symbols<'a>(&self, histories: &'a [InstrumentHistory]) -> Vec<&'a str> {
        Self::prepare(histories)
            .into_iter()
            .map(|inst| inst.symbol)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PricePoint;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn history(symbol: &str, weight: f64, prices: &[(u32, f64)]) -> InstrumentHistory {
        InstrumentHistory::new(
            symbol,
            weight,
            prices
                .iter()
                .map(|&(d, close)| PricePoint::new(day(d), close))
                .collect(),
        )
    }

    #[test]
    fn test_single_instrument_reproduces_prices() {
        let prices = [(1, 100.0), (2, 101.5), (3, 99.25), (6, 103.0)];
        let series = PortfolioAggregator::new().aggregate(&[history("AAPL", 1500.0, &prices)], 10);

        assert_eq!(series.len(), 4);
        for (point, &(d, close)) in series.iter().zip(prices.iter()) {
            assert_eq!(point.date, day(d));
            assert_eq!(point.portfolio_value, close);
        }
    }

    #[test]
    fn test_first_entry_has_zero_returns() {
        let series = PortfolioAggregator::new()
            .aggregate(&[history("AAPL", 1.0, &[(1, 100.0), (2, 110.0), (3, 121.0)])], 10);

        assert_eq!(series[0].period_return, 0.0);
        assert_eq!(series[0].cumulative_return, 0.0);
        assert!((series[1].period_return - 0.10).abs() < 1e-12);
        assert!((series[2].period_return - 0.10).abs() < 1e-12);
        assert!((series[2].cumulative_return - 0.21).abs() < 1e-12);
    }

    #[test]
    fn test_partial_coverage_dates_are_dropped() {
        let a = history("A", 1.0, &[(1, 10.0), (2, 11.0), (3, 12.0)]);
        let b = history("B", 1.0, &[(1, 20.0), (3, 22.0)]);

        let series = PortfolioAggregator::new().aggregate(&[a, b], 10);
        let dates: Vec<NaiveDate> = series.iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![day(1), day(3)]);
    }

    #[test]
    fn test_equal_weight_two_instruments() {
        let a = history("A", 10_000.0, &[(1, 100.0), (2, 101.0), (3, 102.0)]);
        let b = history("B", 10_000.0, &[(1, 50.0), (2, 49.0), (3, 51.0)]);

        let series = PortfolioAggregator::new().aggregate(&[a, b], 3);
        assert_eq!(series.len(), 3);

        let v1 = 100.0 * 0.5 + 50.0 * 0.5;
        let v2 = 101.0 * 0.5 + 49.0 * 0.5;
        let v3 = 102.0 * 0.5 + 51.0 * 0.5;
        assert_eq!(series[0].portfolio_value, v1);
        assert_eq!(series[1].portfolio_value, v2);
        assert_eq!(series[2].portfolio_value, v3);
        assert_eq!(series[1].period_return, (v2 - v1) / v1);
        assert_eq!(series[2].cumulative_return, (v3 - v1) / v1);
    }

    #[test]
    fn test_window_keeps_most_recent_dates() {
        let prices: Vec<(u32, f64)> = (1..=10).map(|d| (d, 100.0 + d as f64)).collect();
        let series = PortfolioAggregator::new().aggregate(&[history("A", 1.0, &prices)], 4);

        let dates: Vec<NaiveDate> = series.iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![day(7), day(8), day(9), day(10)]);
        assert_eq!(series[0].period_return, 0.0);
    }

    #[test]
    fn test_window_counts_dates_from_union() {
        // The union of dates decides the window, a missing date still uses a slot
        let a = history("A", 1.0, &[(1, 10.0), (2, 10.0), (3, 10.0), (4, 10.0)]);
        let b = history("B", 1.0, &[(1, 10.0), (2, 10.0), (4, 10.0)]);

        let series = PortfolioAggregator::new().aggregate(&[a, b], 3);
        let dates: Vec<NaiveDate> = series.iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![day(2), day(4)]);
    }

    #[test]
    fn test_empty_inputs() {
        let aggregator = PortfolioAggregator::new();
        assert!(aggregator.aggregate(&[], 10).is_empty());
        assert!(aggregator
            .aggregate(&[history("A", 0.0, &[(1, 10.0), (2, 11.0)])], 10)
            .is_empty());
        assert!(aggregator.aggregate(&[history("A", 1.0, &[])], 10).is_empty());
        assert!(aggregator
            .aggregate(&[history("A", 1.0, &[(1, 10.0)])], 0)
            .is_empty());
    }

    #[test]
    fn test_no_common_dates_is_empty() {
        let a = history("A", 1.0, &[(1, 10.0), (2, 11.0)]);
        let b = history("B", 1.0, &[(3, 20.0), (4, 21.0)]);
        assert!(PortfolioAggregator::new().aggregate(&[a, b], 10).is_empty());
    }

    #[test]
    fn test_instrument_without_data_is_excluded_from_weights() {
        let a = history("A", 1.0, &[(1, 10.0), (2, 11.0)]);
        let unavailable = history("B", 5.0, &[]);
        let aggregator = PortfolioAggregator::new();

        let series = aggregator.aggregate(&[a, unavailable.clone()], 10);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].portfolio_value, 10.0);
        assert_eq!(series[1].portfolio_value, 11.0);

        let a = history("A", 1.0, &[(1, 10.0)]);
        assert_eq!(aggregator.included_symbols(&[a, unavailable]), vec!["A"]);
    }

    #[test]
    fn test_invalid_prices_count_as_missing() {
        let a = history("A", 1.0, &[(1, 10.0), (2, f64::NAN), (3, 12.0)]);
        let series = PortfolioAggregator::new().aggregate(&[a], 10);
        let dates: Vec<NaiveDate> = series.iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![day(1), day(3)]);
    }
}
