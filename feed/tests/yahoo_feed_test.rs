//! Integration tests for YahooPriceFeed against a mock chart API

use chrono::NaiveDate;
use pfm_feed::{FeedConfig, FeedError, SymbolPrice, YahooPriceFeed};
use pfm_risk::{PriceFeed, PricePoint, RiskError};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn feed(server: &MockServer) -> YahooPriceFeed {
    YahooPriceFeed::new(FeedConfig {
        endpoint: server.uri(),
        api_key: Some("secret".to_string()),
        requests_per_second: 100,
        burst_size: 100,
        ..Default::default()
    })
    .unwrap()
}

fn chart(timestamps: &[i64], closes: serde_json::Value, price: f64) -> serde_json::Value {
    json!({
        "chart": {
            "result": [{
                "meta": {"symbol": "AAPL", "regularMarketPrice": price, "gmtoffset": -14400},
                "timestamp": timestamps,
                "indicators": {"quote": [{"close": closes}]}
            }],
            "error": null
        }
    })
}

#[tokio::test]
async fn test_history_request_and_parsing() {
    let server = MockServer::start().await;

    // period1 = 2024-06-24, period2 = 2024-06-29 (exclusive end)
    Mock::given(method("GET"))
        .and(path("/v8/finance/chart/AAPL"))
        .and(query_param("period1", "1719187200"))
        .and(query_param("period2", "1719619200"))
        .and(query_param("interval", "1d"))
        .and(header("X-API-Key", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chart(
            &[1719408600, 1719495000, 1719581400],
            json!([213.25, null, 210.62]),
            210.62,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let points = feed(&server)
        .history("AAPL", date(2024, 6, 24), date(2024, 6, 28))
        .await
        .unwrap();

    assert_eq!(
        points,
        vec![
            PricePoint::new(date(2024, 6, 26), 213.25),
            PricePoint::new(date(2024, 6, 28), 210.62),
        ]
    );
}

#[tokio::test]
async fn test_latest_price() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v8/finance/chart/VWCE.DE"))
        .and(query_param("range", "5d"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chart(
            &[1719581400],
            json!([118.4]),
            118.9,
        )))
        .mount(&server)
        .await;

    let price = feed(&server).latest_price("VWCE.DE").await.unwrap();
    assert_eq!(price, Some(118.9));
}

#[tokio::test]
async fn test_unknown_symbol_is_feed_unavailable() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v8/finance/chart/NOPE"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "chart": {
                "result": null,
                "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}
            }
        })))
        .mount(&server)
        .await;

    let err = feed(&server)
        .history("NOPE", date(2024, 6, 1), date(2024, 6, 28))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        RiskError::PriceFeedUnavailable {
            symbol: "NOPE".to_string(),
            reason: "Symbol not found: NOPE".to_string(),
        }
    );
}

#[tokio::test]
async fn test_server_error_is_feed_unavailable() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .mount(&server)
        .await;

    let err = feed(&server).latest_price("AAPL").await.unwrap_err();
    assert!(err.is_recoverable());
}

#[tokio::test]
async fn test_single_symbol_price() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v8/finance/chart/AAPL"))
        .and(query_param("range", "5d"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chart(
            &[1719581400],
            json!([210.62]),
            210.5,
        )))
        .mount(&server)
        .await;

    let price = feed(&server).price(" aapl ").await.unwrap();
    assert_eq!(
        price,
        SymbolPrice {
            symbol: "AAPL".to_string(),
            price: 210.5,
        }
    );
}

#[tokio::test]
async fn test_price_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v8/finance/chart/NOPE"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "chart": {
                "result": null,
                "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}
            }
        })))
        .mount(&server)
        .await;

    // Known symbol, but no market price and no closes
    Mock::given(method("GET"))
        .and(path("/v8/finance/chart/EMPTY"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "chart": {"result": [{"meta": {"symbol": "EMPTY"}}], "error": null}
        })))
        .mount(&server)
        .await;

    let feed = feed(&server);
    let err = feed.price("NOPE").await.unwrap_err();
    assert!(matches!(err, FeedError::SymbolNotFound(ref s) if s == "NOPE"));

    let err = feed.price("EMPTY").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_symbol_search() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/finance/search"))
        .and(query_param("q", "apple"))
        .and(query_param("quotesCount", "2"))
        .and(query_param("newsCount", "0"))
        .and(header("X-API-Key", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 3,
            "quotes": [
                {"symbol": "AAPL", "shortname": "Apple Inc.", "longname": "Apple Inc.",
                 "exchange": "NMS", "exchDisp": "NASDAQ", "quoteType": "EQUITY"},
                {"symbol": "APC.DE", "shortname": "APPLE INC", "exchange": "GER",
                 "exchDisp": "XETRA", "quoteType": "EQUITY"},
                {"symbol": "APLE", "shortname": "Apple Hospitality REIT", "quoteType": "EQUITY"}
            ],
            "news": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let matches = feed(&server).search(" apple ", 2).await.unwrap();

    let symbols: Vec<&str> = matches.iter().map(|m| m.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["AAPL", "APC.DE"]);
    assert_eq!(matches[1].name, "APPLE INC");
    assert_eq!(matches[1].exchange.as_deref(), Some("XETRA"));
    assert_eq!(matches[0].quote_type.as_deref(), Some("EQUITY"));
}

#[tokio::test]
async fn test_blank_search_skips_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let feed = feed(&server);
    assert!(feed.search("   ", 10).await.unwrap().is_empty());
    assert!(feed.search("apple", 0).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_search_provider_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/finance/search"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .mount(&server)
        .await;

    let err = feed(&server).search("apple", 5).await.unwrap_err();
    assert!(err.is_retryable());
}
