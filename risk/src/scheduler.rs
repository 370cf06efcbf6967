//! Background price refresh on a fixed interval

use crate::error::Result;
use crate::service::{RefreshSummary, RiskService};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{error, info};

/// Periodic price refresh scheduler
pub struct PriceRefreshScheduler {
    service: Arc<RiskService>,
    interval: Duration,
}

impl PriceRefreshScheduler {
    /// Create a new price refresh scheduler
    pub fn new(service: Arc<RiskService>, interval: Duration) -> Self {
        Self { service, interval }
    }

    /// Run until `shutdown` flips to true or its sender is dropped.
    ///
    /// The first refresh happens immediately. A failed run is logged and the
    /// loop keeps going.
    pub async fn start(self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "Starting price refresh scheduler (interval: {:?})",
            self.interval
        );

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.service.refresh_prices().await {
                        Ok(summary) => {
                            info!(
                                "Scheduled refresh: {}/{} symbols priced, {} positions updated",
                                summary.symbols_priced,
                                summary.symbols_requested,
                                summary.positions_updated
                            );
                        }
                        Err(e) => {
                            error!("Scheduled price refresh failed: {}", e);
                        }
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Price refresh scheduler stopped");
    }

    /// Run a single refresh (for testing or manual execution)
    pub async fn run_once(&self) -> Result<RefreshSummary> {
        info!("Running one-time price refresh");
        let summary = self.service.refresh_prices().await?;
        info!("Refresh summary: {:?}", summary);
        Ok(summary)
    }
}
