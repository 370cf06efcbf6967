//! Yahoo Finance chart API price feed
//!
//! Daily closes and quotes come from `GET /v8/finance/chart/{symbol}`,
//! symbol lookup from `GET /v1/finance/search`.
//! Closes are reported against exchange-local calendar dates: each bar
//! timestamp is shifted by `meta.gmtoffset` before taking its date.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, NaiveDate};
use pfm_risk::{PriceFeed, PricePoint, Result as RiskResult};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::config::FeedConfig;
use crate::error::{FeedError, FeedResult};
use crate::ratelimit::RateLimiter;

const PROVIDER: &str = "yahoo";

/// Latest price of a single symbol
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolPrice {
    pub symbol: String,
    pub price: f64,
}

/// Instrument returned by a symbol search
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolMatch {
    pub symbol: String,
    pub name: String,
    pub exchange: Option<String>,
    pub quote_type: Option<String>,
}

/// Price feed backed by the Yahoo Finance chart API
pub struct YahooPriceFeed {
    config: FeedConfig,
    client: Client,
    base_url: Url,
    limiter: RateLimiter,
}

impl YahooPriceFeed {
    /// Create a new Yahoo price feed
    pub fn new(config: FeedConfig) -> FeedResult<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| FeedError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;
        let base_url = Url::parse(&config.endpoint)?;
        let limiter = RateLimiter::new(PROVIDER, config.requests_per_second, config.burst_size)?;

        Ok(Self {
            config,
            client,
            base_url,
            limiter,
        })
    }

    /// Daily closes in `[start, end]`, ascending, one per date
    pub async fn daily_closes(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> FeedResult<Vec<PricePoint>> {
        if start > end {
            return Ok(Vec::new());
        }

        let query = [
            ("period1", day_start_timestamp(start).to_string()),
            ("period2", day_start_timestamp(end + ChronoDuration::days(1)).to_string()),
            ("interval", "1d".to_string()),
            ("events", "history".to_string()),
        ];
        let chart = self.fetch_chart(symbol, &query).await?;

        let mut points: Vec<PricePoint> = chart
            .closes()
            .into_iter()
            .filter(|p| p.date >= start && p.date <= end)
            .collect();
        points.sort_by_key(|p| p.date);
        // Keep the last bar of a date (intraday bar of the current session)
        points.reverse();
        points.dedup_by_key(|p| p.date);
        points.reverse();

        debug!("Fetched {} daily closes for {} ({} to {})", points.len(), symbol, start, end);
        Ok(points)
    }

    /// Latest market price: `regularMarketPrice`, else the most recent close
    pub async fn quote(&self, symbol: &str) -> FeedResult<Option<f64>> {
        let query = [
            ("range", "5d".to_string()),
            ("interval", "1d".to_string()),
        ];
        let chart = self.fetch_chart(symbol, &query).await?;

        let price = chart
            .meta
            .regular_market_price
            .filter(|p| p.is_finite() && *p > 0.0)
            .or_else(|| chart.closes().last().map(|p| p.close));

        debug!("Quote for {}: {:?}", symbol, price);
        Ok(price)
    }

    /// Latest price of `symbol`; `SymbolNotFound` when the provider has none
    pub async fn price(&self, symbol: &str) -> FeedResult<SymbolPrice> {
        let symbol = symbol.trim().to_uppercase();
        match self.quote(&symbol).await? {
            Some(price) => Ok(SymbolPrice { symbol, price }),
            None => Err(FeedError::SymbolNotFound(symbol)),
        }
    }

    /// Instruments matching a name or ticker fragment, at most `limit`
    pub async fn search(&self, query: &str, limit: usize) -> FeedResult<Vec<SymbolMatch>> {
        let query = query.trim();
        if query.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let url = self.endpoint_url(
            &["v1", "finance", "search"],
            &[
                ("q", query.to_string()),
                ("quotesCount", limit.to_string()),
                ("newsCount", "0".to_string()),
            ],
        )?;
        let (status, body) = self.get(url).await?;

        let mut matches = parse_search(query, status, &body)?;
        matches.truncate(limit);
        debug!("Search for {:?} returned {} matches", query, matches.len());
        Ok(matches)
    }

    fn endpoint_url(&self, segments: &[&str], query: &[(&str, String)]) -> FeedResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| FeedError::ConfigError(format!("Endpoint cannot be a base URL: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        url.query_pairs_mut()
            .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        Ok(url)
    }

    /// Rate-limited GET returning status and body
    async fn get(&self, url: Url) -> FeedResult<(StatusCode, String)> {
        self.limiter.check().await;

        let mut request = self.client.get(url);
        if let Some(api_key) = &self.config.api_key {
            request = request.header("X-API-Key", api_key);
        }
        let response = request.send().await?;

        let status = response.status();
        let body = response.text().await?;
        Ok((status, body))
    }

    async fn fetch_chart(&self, symbol: &str, query: &[(&str, String)]) -> FeedResult<ChartResult> {
        if symbol.trim().is_empty() {
            return Err(FeedError::SymbolNotFound(symbol.to_string()));
        }

        let url = self.endpoint_url(&["v8", "finance", "chart", symbol], query)?;
        let (status, body) = self.get(url).await?;
        parse_chart(symbol, status, &body)
    }
}

#[async_trait]
impl PriceFeed for YahooPriceFeed {
    async fn history(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> RiskResult<Vec<PricePoint>> {
        self.daily_closes(symbol, start, end)
            .await
            .map_err(|e| e.into_risk_error(symbol))
    }

    async fn latest_price(&self, symbol: &str) -> RiskResult<Option<f64>> {
        self.quote(symbol).await.map_err(|e| e.into_risk_error(symbol))
    }
}

fn day_start_timestamp(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or_default()
}

/// Map a chart API response to its first result or a typed error
fn parse_chart(symbol: &str, status: StatusCode, body: &str) -> FeedResult<ChartResult> {
    let response: ChartResponse = match serde_json::from_str(body) {
        Ok(response) => response,
        Err(e) if status.is_success() => return Err(e.into()),
        Err(_) => {
            return Err(FeedError::Provider {
                symbol: symbol.to_string(),
                message: format!("HTTP {}", status),
                code: Some(status.as_str().to_string()),
            })
        }
    };

    if let Some(error) = response.chart.error {
        if status == StatusCode::NOT_FOUND || error.code.eq_ignore_ascii_case("Not Found") {
            return Err(FeedError::SymbolNotFound(symbol.to_string()));
        }
        return Err(FeedError::Provider {
            symbol: symbol.to_string(),
            message: error.description,
            code: Some(error.code),
        });
    }

    if !status.is_success() {
        return Err(FeedError::Provider {
            symbol: symbol.to_string(),
            message: format!("HTTP {}", status),
            code: Some(status.as_str().to_string()),
        });
    }

    response
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| FeedError::InvalidResponse(format!("Empty chart result for {}", symbol)))
}

/// Map a search response to matches; quotes without a symbol are skipped
fn parse_search(query: &str, status: StatusCode, body: &str) -> FeedResult<Vec<SymbolMatch>> {
    if !status.is_success() {
        return Err(FeedError::Provider {
            symbol: query.to_string(),
            message: format!("HTTP {}", status),
            code: Some(status.as_str().to_string()),
        });
    }

    let response: SearchResponse = serde_json::from_str(body)?;
    Ok(response
        .quotes
        .into_iter()
        .filter_map(|quote| {
            let symbol = quote.symbol.filter(|s| !s.trim().is_empty())?;
            let name = quote
                .longname
                .or(quote.shortname)
                .unwrap_or_else(|| symbol.clone());
            Some(SymbolMatch {
                symbol,
                name,
                exchange: quote.exch_disp.or(quote.exchange),
                quote_type: quote.quote_type,
            })
        })
        .collect())
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    quotes: Vec<SearchQuote>,
}

#[derive(Debug, Deserialize)]
struct SearchQuote {
    symbol: Option<String>,
    shortname: Option<String>,
    longname: Option<String>,
    exchange: Option<String>,
    #[serde(rename = "exchDisp")]
    exch_disp: Option<String>,
    #[serde(rename = "quoteType")]
    quote_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    #[serde(default)]
    indicators: Indicators,
}

impl ChartResult {
    /// Non-null positive closes keyed by exchange-local date
    fn closes(&self) -> Vec<PricePoint> {
        let closes = self
            .indicators
            .quote
            .first()
            .map(|q| q.close.as_slice())
            .unwrap_or_default();

        self.timestamp
            .iter()
            .zip(closes)
            .filter_map(|(&ts, close)| {
                let close = (*close)?;
                let date = DateTime::from_timestamp(ts + self.meta.gmtoffset, 0)?.date_naive();
                let point = PricePoint::new(date, close);
                point.is_valid().then_some(point)
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    regular_market_price: Option<f64>,
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Default, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteBars>,
}

#[derive(Debug, Deserialize)]
struct QuoteBars {
    #[serde(default)]
    close: Vec<Option<f64>>,
}
