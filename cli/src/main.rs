use anyhow::{bail, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use pfm_feed::{CachedPriceFeed, YahooPriceFeed};
use pfm_risk::{PriceRefreshScheduler, RiskRequest, RiskService};
use pfm_storage::MemoryLedger;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

mod config;

use config::Config;

#[derive(Parser, Debug)]
#[clap(name = "pfm-risk", about = "Portfolio risk analytics for a personal finance ledger")]
struct Args {
    /// YAML configuration file
    #[clap(short, long, global = true)]
    config: Option<PathBuf>,

    /// Ledger snapshot, overrides storage.seed_file
    #[clap(short, long, global = true)]
    ledger: Option<PathBuf>,

    /// Pretty-print JSON output
    #[clap(long, global = true)]
    pretty: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Value at Risk, expected shortfall and risk metrics
    Report {
        /// Confidence levels, comma separated (e.g. 0.95,0.99)
        #[clap(long, value_delimiter = ',')]
        confidence: Vec<f64>,

        /// Time horizon in days
        #[clap(long, default_value_t = 1)]
        horizon: u32,

        /// Lookback window in calendar days
        #[clap(long)]
        lookback: Option<u32>,

        /// Valuation date (YYYY-MM-DD), today by default
        #[clap(long)]
        as_of: Option<NaiveDate>,
    },

    /// Aggregated daily portfolio value
    History {
        #[clap(long, default_value_t = 30)]
        days: u32,

        #[clap(long)]
        as_of: Option<NaiveDate>,
    },

    /// Current portfolio valuation
    Value,

    /// Fetch latest prices into the ledger
    Refresh,

    /// Latest price of a single symbol
    Price {
        symbol: String,
    },

    /// Search instruments by name or ticker
    Search {
        query: String,

        /// Maximum number of matches
        #[clap(long, default_value_t = 10)]
        limit: usize,
    },

    /// Refresh prices periodically until interrupted
    Schedule {
        /// Refresh interval in seconds, overrides scheduler.refresh_interval_sec
        #[clap(long)]
        interval_sec: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Logs go to stderr, stdout carries JSON
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            Config::load(path)?
        }
        None => Config::default(),
    };
    if let Some(ledger) = args.ledger {
        config.storage.seed_file = Some(ledger);
    }

    let feed_config = config.feed.clone().with_env_api_key();
    let quote_ttl = feed_config.quote_cache_ttl();
    let feed = Arc::new(CachedPriceFeed::new(YahooPriceFeed::new(feed_config)?, quote_ttl));

    // Lookups that do not touch the ledger
    match &args.command {
        Command::Price { symbol } => {
            let price = match feed.inner().price(symbol).await {
                Ok(price) => price,
                Err(e) if e.is_not_found() => bail!("No price found for symbol {}", symbol.trim()),
                Err(e) => return Err(e.into()),
            };
            return print_json(&price, args.pretty);
        }
        Command::Search { query, limit } => {
            let matches = feed.inner().search(query, *limit).await?;
            if matches.is_empty() {
                warn!("No instruments match {:?}", query);
            }
            return print_json(&matches, args.pretty);
        }
        _ => {}
    }

    let ledger = Arc::new(MemoryLedger::open(config.storage.clone()).await?);
    info!("Ledger holds {} investments", ledger.len().await);

    let service = Arc::new(RiskService::new(ledger.clone(), feed, config.risk.clone())?);

    match args.command {
        Command::Report {
            confidence,
            horizon,
            lookback,
            as_of,
        } => {
            let mut request = RiskRequest::new(confidence).with_horizon(horizon);
            if let Some(lookback) = lookback {
                request = request.with_lookback(lookback);
            }
            if let Some(as_of) = as_of {
                request = request.with_as_of(as_of);
            }

            let report = service.compute_risk_report(&request).await?;
            print_json(&report, args.pretty)?;
        }
        Command::History { days, as_of } => {
            let as_of = as_of.unwrap_or_else(|| Utc::now().date_naive());
            let history = service.portfolio_history(days, as_of).await?;
            print_json(&history, args.pretty)?;
        }
        Command::Value => {
            let valuation = service.valuation().await?;
            print_json(&valuation, args.pretty)?;
        }
        Command::Refresh => {
            let summary = service.refresh_prices().await?;
            if !config.storage.autosave {
                if let Some(path) = &config.storage.seed_file {
                    ledger.save(path).await?;
                }
            }
            print_json(&summary, args.pretty)?;
        }
        Command::Schedule { interval_sec } => {
            let interval = interval_sec
                .filter(|s| *s > 0)
                .map(Duration::from_secs)
                .unwrap_or_else(|| config.scheduler.refresh_interval());
            if !config.storage.autosave {
                warn!("storage.autosave is off, refreshed prices stay in memory");
            }

            let (shutdown_tx, shutdown_rx) = watch::channel(false);
            let scheduler = PriceRefreshScheduler::new(service.clone(), interval);
            let handle = tokio::spawn(scheduler.start(shutdown_rx));

            tokio::signal::ctrl_c().await?;
            info!("Shutdown requested");
            shutdown_tx.send(true).ok();
            handle.await?;
        }
        Command::Price { .. } | Command::Search { .. } => {}
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", json);
    Ok(())
}
