//! # pfm-feed: Price feed adapters
//!
//! Implementations of `pfm_risk::PriceFeed`:
//!
//! - **YahooPriceFeed**: Daily closes and quotes from the Yahoo Finance chart API,
//!   rate limited with a token bucket; also single-symbol price lookup and
//!   symbol search
//! - **CachedPriceFeed**: Latest-quote TTL cache around any feed, serving the
//!   last known quote when the provider fails
//!
//! ## Example
//!
//! ```rust,no_run
//! use pfm_feed::{CachedPriceFeed, FeedConfig, YahooPriceFeed};
//! use pfm_risk::PriceFeed;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = FeedConfig::default();
//! let ttl = config.quote_cache_ttl();
//! let feed = CachedPriceFeed::new(YahooPriceFeed::new(config)?, ttl);
//!
//! let price = feed.latest_price("AAPL").await?;
//! println!("AAPL: {:?}", price);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod ratelimit;
pub mod yahoo;

pub use cache::CachedPriceFeed;
pub use config::{FeedConfig, API_KEY_ENV};
pub use error::{FeedError, FeedResult};
pub use ratelimit::RateLimiter;
pub use yahoo::{SymbolMatch, SymbolPrice, YahooPriceFeed};
