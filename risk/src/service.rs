//! Risk service orchestrating ledger, price feed and the risk pipeline
//!
//! The RiskService is the entry point used by the surrounding application.
//! It reads positions from the ledger, fans out price history requests,
//! aggregates the portfolio series and builds the risk report.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::aggregator::PortfolioAggregator;
use crate::config::{RiskConfig, WeightingScheme};
use crate::error::{Result, RiskError};
use crate::estimator::{validate_confidence_level, RiskEstimator};
use crate::feed::PriceFeed;
use crate::ledger::LedgerStore;
use crate::report::{ReportAssembler, ReportContext, RiskReport};
use crate::returns::extract_returns;
use crate::types::{InstrumentHistory, PortfolioPoint, Position};
use crate::valuation::PortfolioValuation;

/// Parameters of a risk report request
#[derive(Debug, Clone, PartialEq)]
pub struct RiskRequest {
    /// Confidence levels in (0, 1); empty means the configured defaults
    pub confidence_levels: Vec<f64>,

    /// Horizon echoed in the report, in days
    pub horizon_days: u32,

    /// Lookback window in calendar days; None means the configured default
    pub lookback_days: Option<u32>,

    /// Valuation date; None means today (UTC)
    pub as_of: Option<NaiveDate>,
}

impl RiskRequest {
    pub fn new(confidence_levels: Vec<f64>) -> Self {
        Self {
            confidence_levels,
            ..Default::default()
        }
    }

    pub fn with_horizon(mut self, horizon_days: u32) -> Self {
        self.horizon_days = horizon_days;
        self
    }

    pub fn with_lookback(mut self, lookback_days: u32) -> Self {
        self.lookback_days = Some(lookback_days);
        self
    }

    pub fn with_as_of(mut self, as_of: NaiveDate) -> Self {
        self.as_of = Some(as_of);
        self
    }
}

impl Default for RiskRequest {
    fn default() -> Self {
        Self {
            confidence_levels: Vec::new(),
            horizon_days: 1,
            lookback_days: None,
            as_of: None,
        }
    }
}

/// Outcome of a price refresh run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RefreshSummary {
    pub symbols_requested: usize,
    pub symbols_priced: usize,
    pub positions_updated: usize,
    /// Symbols without a usable quote, sorted
    pub failed_symbols: Vec<String>,
    /// Ledger writes that failed
    pub failed_updates: usize,
}

/// Risk computation service
pub struct RiskService {
    ledger: Arc<dyn LedgerStore>,
    feed: Arc<dyn PriceFeed>,
    config: RiskConfig,
    aggregator: PortfolioAggregator,
    estimator: RiskEstimator,
    assembler: ReportAssembler,
}

impl RiskService {
    /// Create a new service; fails if the configuration is invalid
    pub fn new(
        ledger: Arc<dyn LedgerStore>,
        feed: Arc<dyn PriceFeed>,
        config: RiskConfig,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            ledger,
            feed,
            aggregator: PortfolioAggregator::new(),
            estimator: RiskEstimator::new(&config),
            assembler: ReportAssembler::new(config.placeholder_value),
            config,
        })
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Compute VaR, expected shortfall and risk metrics for the ledger portfolio.
    ///
    /// An empty ledger yields a placeholder report. Fewer than
    /// `min_observations` aligned returns fail with `InsufficientData`.
    pub async fn compute_risk_report(&self, request: &RiskRequest) -> Result<RiskReport> {
        let levels = self.resolve_levels(&request.confidence_levels)?;
        if request.horizon_days == 0 {
            return Err(RiskError::InvalidTimeHorizon(request.horizon_days));
        }
        let lookback_days = request
            .lookback_days
            .unwrap_or(self.config.default_lookback_days);
        self.check_window("lookback_days", lookback_days)?;
        let as_of = request.as_of.unwrap_or_else(|| Utc::now().date_naive());

        let context = ReportContext {
            time_horizon_days: request.horizon_days,
            lookback_days,
            as_of,
        };

        info!(
            "Computing risk report (levels: {:?}, lookback: {} days, as of {})",
            levels, lookback_days, as_of
        );

        let positions = match self.load_positions().await {
            Ok(positions) => positions,
            Err(RiskError::NoPositions) => {
                info!("Ledger has no positions, returning placeholder report");
                return Ok(self.assembler.placeholder(&levels, context));
            }
            Err(e) => return Err(e),
        };

        let series = self.build_series(&positions, lookback_days, as_of).await?;
        let returns = match extract_returns(&series, self.config.min_observations) {
            Ok(returns) => returns,
            Err(e) => {
                warn!("Cannot compute risk report: {}", e);
                return Err(e);
            }
        };

        let estimate = self.estimator.estimate(&returns, &levels)?;
        let report = self.assembler.assemble(&estimate, &positions, context);

        info!(
            "Risk report computed from {} returns (current value {:.2})",
            report.observations, report.current_value
        );
        Ok(report)
    }

    /// Aggregated portfolio value series over the last `days` dates.
    ///
    /// Empty when the ledger has no positions or no date has full coverage.
    pub async fn portfolio_history(&self, days: u32, as_of: NaiveDate) -> Result<Vec<PortfolioPoint>> {
        self.check_window("days", days)?;
        let positions = match self.load_positions().await {
            Ok(positions) => positions,
            Err(RiskError::NoPositions) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        self.build_series(&positions, days, as_of).await
    }

    /// Current valuation of the ledger portfolio
    pub async fn valuation(&self) -> Result<PortfolioValuation> {
        let positions = self.ledger.list_positions().await?;
        Ok(PortfolioValuation::from_positions(&positions))
    }

    /// Fetch the latest price of every held symbol and write it to the ledger.
    ///
    /// Feed and ledger failures are logged and counted, never propagated.
    pub async fn refresh_prices(&self) -> Result<RefreshSummary> {
        let positions = self.ledger.list_positions().await?;
        if positions.is_empty() {
            info!("No positions to refresh");
            return Ok(RefreshSummary::default());
        }

        let symbols: BTreeSet<String> = positions.iter().map(|p| p.symbol.clone()).collect();
        info!("Refreshing prices for {} symbols", symbols.len());

        let fetch_timeout = self.config.fetch_timeout();
        let feed = &self.feed;
        let quotes: Vec<(String, Option<f64>)> = stream::iter(symbols.iter().cloned())
            .map(|symbol| async move {
                match timeout(fetch_timeout, feed.latest_price(&symbol)).await {
                    Ok(Ok(Some(price))) if price.is_finite() && price > 0.0 => (symbol, Some(price)),
                    Ok(Ok(_)) => {
                        warn!("No usable quote for {}", symbol);
                        (symbol, None)
                    }
                    Ok(Err(e)) => {
                        warn!("Quote request failed for {}: {}", symbol, e);
                        (symbol, None)
                    }
                    Err(_) => {
                        warn!("Quote request for {} timed out after {:?}", symbol, fetch_timeout);
                        (symbol, None)
                    }
                }
            })
            .buffer_unordered(self.config.max_concurrent_fetches)
            .collect()
            .await;

        let mut prices: HashMap<String, f64> = HashMap::new();
        let mut failed_symbols = Vec::new();
        for (symbol, price) in quotes {
            match price {
                Some(price) => {
                    prices.insert(symbol, price);
                }
                None => failed_symbols.push(symbol),
            }
        }
        failed_symbols.sort();

        let mut positions_updated = 0;
        let mut failed_updates = 0;
        for position in &positions {
            let Some(&price) = prices.get(&position.symbol) else {
                continue;
            };
            match self.ledger.update_current_price(position.id, price).await {
                Ok(()) => {
                    debug!("Updated {} ({}): {:.4}", position.symbol, position.id, price);
                    positions_updated += 1;
                }
                Err(e) => {
                    error!("Failed to store price for {} ({}): {}", position.symbol, position.id, e);
                    failed_updates += 1;
                }
            }
        }

        let summary = RefreshSummary {
            symbols_requested: symbols.len(),
            symbols_priced: prices.len(),
            positions_updated,
            failed_symbols,
            failed_updates,
        };
        info!(
            "Price refresh completed: {}/{} symbols priced, {} positions updated",
            summary.symbols_priced, summary.symbols_requested, summary.positions_updated
        );
        Ok(summary)
    }

    async fn load_positions(&self) -> Result<Vec<Position>> {
        let positions = self.ledger.list_positions().await?;
        if positions.is_empty() {
            return Err(RiskError::NoPositions);
        }
        Ok(positions)
    }

    async fn build_series(
        &self,
        positions: &[Position],
        days: u32,
        as_of: NaiveDate,
    ) -> Result<Vec<PortfolioPoint>> {
        let span = Duration::days(i64::from(days) + i64::from(self.config.lookback_padding_days));
        let start = as_of.checked_sub_signed(span).ok_or_else(|| {
            RiskError::InvalidParameter(format!("{} days before {} is out of range", days, as_of))
        })?;
        let histories = self.fetch_histories(self.weights(positions), start, as_of).await;

        let series = self.aggregator.aggregate(&histories, days as usize);
        debug!(
            "Aggregated {} instruments into {} portfolio points",
            histories.len(),
            series.len()
        );
        Ok(series)
    }

    /// Window sizes must be positive and within `max_lookback_days`
    fn check_window(&self, name: &str, days: u32) -> Result<()> {
        if days == 0 || days > self.config.max_lookback_days {
            return Err(RiskError::InvalidParameter(format!(
                "{} must be in 1..={}, got {}",
                name, self.config.max_lookback_days, days
            )));
        }
        Ok(())
    }

    /// Static weight per symbol, lots of the same symbol merged, sorted by symbol
    fn weights(&self, positions: &[Position]) -> Vec<(String, f64)> {
        let mut weights: BTreeMap<String, f64> = BTreeMap::new();
        for position in positions {
            let weight = match self.config.weighting {
                WeightingScheme::AcquisitionValue => position.cost_basis(),
                WeightingScheme::CurrentValue => position.market_value(),
            };
            *weights.entry(position.symbol.clone()).or_insert(0.0) += weight;
        }
        weights.into_iter().collect()
    }

    /// Fetch histories concurrently; failed, timed-out or empty fetches are excluded
    async fn fetch_histories(
        &self,
        weights: Vec<(String, f64)>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Vec<InstrumentHistory> {
        let fetch_timeout = self.config.fetch_timeout();
        let feed = &self.feed;

        let results: Vec<Option<InstrumentHistory>> = stream::iter(weights)
            .map(|(symbol, weight)| async move {
                match timeout(fetch_timeout, feed.history(&symbol, start, end)).await {
                    Ok(Ok(points)) if !points.is_empty() => {
                        debug!("Fetched {} price points for {}", points.len(), symbol);
                        Some(InstrumentHistory::new(symbol, weight, points))
                    }
                    Ok(Ok(_)) => {
                        warn!("No price history for {}, excluding from portfolio", symbol);
                        None
                    }
                    Ok(Err(e)) => {
                        warn!("Excluding {} from portfolio: {}", symbol, e);
                        None
                    }
                    Err(_) => {
                        warn!(
                            "Price history for {} timed out after {:?}, excluding from portfolio",
                            symbol, fetch_timeout
                        );
                        None
                    }
                }
            })
            .buffer_unordered(self.config.max_concurrent_fetches)
            .collect()
            .await;

        let mut histories: Vec<InstrumentHistory> = results.into_iter().flatten().collect();
        histories.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        histories
    }

    /// Requested levels validated and de-duplicated, configured defaults when empty
    fn resolve_levels(&self, requested: &[f64]) -> Result<Vec<f64>> {
        let source = if requested.is_empty() {
            &self.config.default_confidence_levels
        } else {
            requested
        };

        let mut levels: Vec<f64> = Vec::with_capacity(source.len());
        for &level in source {
            validate_confidence_level(level)?;
            if !levels.contains(&level) {
                levels.push(level);
            }
        }
        Ok(levels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use uuid::Uuid;

    struct StaticLedger(Vec<Position>);

    #[async_trait]
    impl LedgerStore for StaticLedger {
        async fn list_positions(&self) -> Result<Vec<Position>> {
            Ok(self.0.clone())
        }

        async fn update_current_price(&self, _id: Uuid, _price: f64) -> Result<()> {
            Ok(())
        }
    }

    struct EmptyFeed;

    #[async_trait]
    impl PriceFeed for EmptyFeed {
        async fn history(&self, _symbol: &str, _start: NaiveDate, _end: NaiveDate) -> Result<Vec<crate::types::PricePoint>> {
            Ok(Vec::new())
        }

        async fn latest_price(&self, _symbol: &str) -> Result<Option<f64>> {
            Ok(None)
        }
    }

    fn service(positions: Vec<Position>, config: RiskConfig) -> RiskService {
        RiskService::new(Arc::new(StaticLedger(positions)), Arc::new(EmptyFeed), config).unwrap()
    }

    #[test]
    fn test_weights_merge_lots_and_sort() {
        let svc = service(Vec::new(), RiskConfig::default());
        let positions = vec![
            Position::new("VWCE", 2.0, 100.0),
            Position::new("AAPL", 1.0, 150.0).with_current_price(300.0),
            Position::new("AAPL", 1.0, 50.0),
        ];

        assert_eq!(
            svc.weights(&positions),
            vec![("AAPL".to_string(), 200.0), ("VWCE".to_string(), 200.0)]
        );

        let current = service(
            Vec::new(),
            RiskConfig {
                weighting: WeightingScheme::CurrentValue,
                ..Default::default()
            },
        );
        assert_eq!(
            current.weights(&positions),
            vec![("AAPL".to_string(), 350.0), ("VWCE".to_string(), 200.0)]
        );
    }

    #[test]
    fn test_resolve_levels() {
        let svc = service(Vec::new(), RiskConfig::default());
        assert_eq!(svc.resolve_levels(&[]).unwrap(), vec![0.95, 0.99]);
        assert_eq!(svc.resolve_levels(&[0.99, 0.9, 0.99]).unwrap(), vec![0.99, 0.9]);
        assert_eq!(
            svc.resolve_levels(&[0.95, 1.2]),
            Err(RiskError::InvalidConfidenceLevel(1.2))
        );
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = RiskConfig {
            max_concurrent_fetches: 0,
            ..Default::default()
        };
        let result = RiskService::new(Arc::new(StaticLedger(Vec::new())), Arc::new(EmptyFeed), config);
        assert!(matches!(result, Err(RiskError::Config(_))));
    }

    #[tokio::test]
    async fn test_empty_ledger_gives_placeholder() {
        let svc = service(Vec::new(), RiskConfig::default());
        let report = svc.compute_risk_report(&RiskRequest::default()).await.unwrap();
        assert!(report.is_placeholder());
        assert_eq!(report.current_value, 10_000.0);
        assert_eq!(report.confidence_levels, vec![0.95, 0.99]);
    }

    #[tokio::test]
    async fn test_no_history_is_insufficient_data() {
        let svc = service(vec![Position::new("AAPL", 1.0, 100.0)], RiskConfig::default());
        let err = svc.compute_risk_report(&RiskRequest::default()).await.unwrap_err();
        assert_eq!(
            err,
            RiskError::InsufficientData {
                required: 30,
                available: 0
            }
        );
    }

    #[tokio::test]
    async fn test_oversized_windows_rejected() {
        let svc = service(vec![Position::new("AAPL", 1.0, 100.0)], RiskConfig::default());
        let as_of = NaiveDate::from_ymd_opt(2024, 6, 28).unwrap();

        let request = RiskRequest::new(vec![0.95]).with_lookback(u32::MAX).with_as_of(as_of);
        assert!(matches!(
            svc.compute_risk_report(&request).await,
            Err(RiskError::InvalidParameter(_))
        ));

        let request = RiskRequest::new(vec![0.95]).with_lookback(0).with_as_of(as_of);
        assert!(matches!(
            svc.compute_risk_report(&request).await,
            Err(RiskError::InvalidParameter(_))
        ));

        assert!(matches!(
            svc.portfolio_history(u32::MAX, as_of).await,
            Err(RiskError::InvalidParameter(_))
        ));
        assert!(matches!(
            svc.portfolio_history(3_651, as_of).await,
            Err(RiskError::InvalidParameter(_))
        ));
    }

    #[tokio::test]
    async fn test_window_before_earliest_date_rejected() {
        let svc = service(vec![Position::new("AAPL", 1.0, 100.0)], RiskConfig::default());
        let request = RiskRequest::new(vec![0.95])
            .with_lookback(3_650)
            .with_as_of(NaiveDate::MIN);
        assert!(matches!(
            svc.compute_risk_report(&request).await,
            Err(RiskError::InvalidParameter(_))
        ));
    }

    #[tokio::test]
    async fn test_zero_horizon_rejected() {
        let svc = service(Vec::new(), RiskConfig::default());
        let request = RiskRequest::new(vec![0.95]).with_horizon(0);
        assert_eq!(
            svc.compute_risk_report(&request).await,
            Err(RiskError::InvalidTimeHorizon(0))
        );
    }
}
