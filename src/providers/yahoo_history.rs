use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::cache::Cache;
use crate::history::{Bar, HistoryOutcome, HistoryProvider, PriceSeries};

/// Fixed lookback window and granularity of every history fetch.
const HISTORY_RANGE: &str = "1y";
const HISTORY_INTERVAL: &str = "1d";

// YahooHistoryProvider implementation for HistoryProvider
pub struct YahooHistoryProvider {
    base_url: String,
    cache: Arc<Cache<String, HistoryOutcome>>,
}

impl YahooHistoryProvider {
    pub fn new(base_url: &str, cache: Arc<Cache<String, HistoryOutcome>>) -> Self {
        YahooHistoryProvider {
            base_url: base_url.to_string(),
            cache,
        }
    }

    async fn fetch_series(&self, symbol: &str) -> Result<PriceSeries> {
        let url = format!(
            "{}/v8/finance/chart/{}?interval={}&range={}",
            self.base_url, symbol, HISTORY_INTERVAL, HISTORY_RANGE
        );
        debug!("Requesting price history from {}", url);

        let client = reqwest::Client::builder().user_agent("spdash/0.1").build()?;
        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for symbol: {} URL: {}", e, symbol, url))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for symbol: {}",
                response.status(),
                symbol
            ));
        }

        let text = response.text().await?;

        let data: ChartResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response for {}: {}", symbol, e))?;

        if let Some(error) = data.chart.error {
            bail!("Provider error for {}: {}", symbol, error.description);
        }

        let item = data
            .chart
            .result
            .unwrap_or_default()
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("No history data found for symbol: {}", symbol))?;

        build_series(symbol, &item)
    }
}

#[derive(Deserialize, Debug)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Deserialize, Debug)]
struct ChartResult {
    result: Option<Vec<ChartItem>>,
    error: Option<ChartApiError>,
}

#[derive(Deserialize, Debug)]
struct ChartApiError {
    description: String,
}

#[derive(Deserialize, Debug)]
struct ChartItem {
    timestamp: Option<Vec<i64>>,
    indicators: Option<Indicators>,
}

#[derive(Deserialize, Debug)]
struct Indicators {
    quote: Vec<QuoteBlock>,
}

#[derive(Deserialize, Debug)]
struct QuoteBlock {
    open: Option<Vec<Option<f64>>>,
    high: Option<Vec<Option<f64>>>,
    low: Option<Vec<Option<f64>>>,
    close: Option<Vec<Option<f64>>>,
    volume: Option<Vec<Option<u64>>>,
}

/// Assembles chronological bars out of the chart item's parallel arrays.
/// Bars with a missing OHLC value are dropped; a missing volume counts as
/// zero.
fn build_series(symbol: &str, item: &ChartItem) -> Result<PriceSeries> {
    let timestamps = item
        .timestamp
        .as_ref()
        .ok_or_else(|| anyhow!("No timestamps in history for symbol: {}", symbol))?;
    let quote = item
        .indicators
        .as_ref()
        .and_then(|inds| inds.quote.first())
        .ok_or_else(|| anyhow!("No quote data in history for symbol: {}", symbol))?;

    let series_column = |column: &Option<Vec<Option<f64>>>| -> Vec<Option<f64>> {
        column.clone().unwrap_or_default()
    };
    let opens = series_column(&quote.open);
    let highs = series_column(&quote.high);
    let lows = series_column(&quote.low);
    let closes = series_column(&quote.close);
    let volumes = quote.volume.clone().unwrap_or_default();

    let mut bars = Vec::with_capacity(timestamps.len());
    for (i, ts) in timestamps.iter().enumerate() {
        let ohlc = (
            opens.get(i).copied().flatten(),
            highs.get(i).copied().flatten(),
            lows.get(i).copied().flatten(),
            closes.get(i).copied().flatten(),
        );
        let (Some(open), Some(high), Some(low), Some(close)) = ohlc else {
            continue;
        };
        let Some(date) = Utc.timestamp_opt(*ts, 0).single().map(|dt| dt.date_naive()) else {
            continue;
        };
        bars.push(Bar {
            date,
            open,
            high,
            low,
            close,
            volume: volumes.get(i).copied().flatten().unwrap_or(0),
        });
    }

    // The provider returns ascending timestamps; the chronological
    // invariant must hold regardless
    bars.sort_by_key(|b| b.date);

    if bars.is_empty() {
        bail!("Empty price history for symbol: {}", symbol);
    }

    Ok(PriceSeries {
        symbol: symbol.to_string(),
        bars,
    })
}

#[async_trait]
impl HistoryProvider for YahooHistoryProvider {
    #[instrument(
        name = "YahooHistoryFetch",
        skip(self),
        fields(symbol = %symbol)
    )]
    async fn fetch_history(&self, symbol: &str) -> HistoryOutcome {
        if let Some(cached) = self.cache.get(&symbol.to_string()).await {
            return cached;
        }

        let outcome = match self.fetch_series(symbol).await {
            Ok(series) => HistoryOutcome::Series(series),
            Err(e) => {
                warn!("History fetch failed for {}: {}", symbol, e);
                HistoryOutcome::NoData {
                    reason: e.to_string(),
                }
            }
        };

        // NoData is memoized too; a symbol that failed once stays
        // failed for the process lifetime
        self.cache.put(symbol.to_string(), outcome.clone()).await;

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub async fn create_mock_server(symbol: &str, mock_response: &str) -> MockServer {
        let mock_server = MockServer::start().await;
        let request_path = format!("/v8/finance/chart/{symbol}");

        Mock::given(method("GET"))
            .and(path(request_path))
            .respond_with(ResponseTemplate::new(200).set_body_string(mock_response))
            .mount(&mock_server)
            .await;

        mock_server
    }

    fn chart_body(timestamps: &[i64], closes: &[f64]) -> String {
        let ts = timestamps
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        let quote = |offset: f64| {
            closes
                .iter()
                .map(|c| (c + offset).to_string())
                .collect::<Vec<_>>()
                .join(", ")
        };
        let volumes = closes.iter().map(|_| "1000").collect::<Vec<_>>().join(", ");
        format!(
            r#"{{
                "chart": {{
                    "result": [{{
                        "meta": {{ "currency": "USD", "symbol": "TEST" }},
                        "timestamp": [{ts}],
                        "indicators": {{
                            "quote": [{{
                                "open": [{}],
                                "high": [{}],
                                "low": [{}],
                                "close": [{}],
                                "volume": [{volumes}]
                            }}]
                        }}
                    }}],
                    "error": null
                }}
            }}"#,
            quote(-1.0),
            quote(1.0),
            quote(-2.0),
            quote(0.0),
        )
    }

    #[tokio::test]
    async fn test_successful_history_fetch() {
        // Two consecutive trading days, UTC seconds
        let body = chart_body(&[1704207600, 1704294000], &[150.0, 152.5]);
        let mock_server = create_mock_server("AAPL", &body).await;
        let cache = Arc::new(Cache::new());

        let provider = YahooHistoryProvider::new(&mock_server.uri(), cache);
        let outcome = provider.fetch_history("AAPL").await;

        let series = outcome.series().expect("expected a series");
        assert_eq!(series.symbol, "AAPL");
        assert_eq!(series.len(), 2);
        assert_eq!(series.bars[0].close, 150.0);
        assert_eq!(series.bars[0].open, 149.0);
        assert_eq!(series.bars[0].high, 151.0);
        assert_eq!(series.bars[0].low, 148.0);
        assert_eq!(series.bars[0].volume, 1000);
        assert_eq!(series.bars[1].close, 152.5);
        assert!(series.bars[0].date < series.bars[1].date);
    }

    #[tokio::test]
    async fn test_bars_are_sorted_chronologically() {
        let body = chart_body(&[1704294000, 1704207600], &[152.5, 150.0]);
        let mock_server = create_mock_server("AAPL", &body).await;
        let cache = Arc::new(Cache::new());

        let provider = YahooHistoryProvider::new(&mock_server.uri(), cache);
        let outcome = provider.fetch_history("AAPL").await;

        let series = outcome.series().expect("expected a series");
        assert!(series.bars[0].date < series.bars[1].date);
        assert_eq!(series.bars[0].close, 150.0);
    }

    #[tokio::test]
    async fn test_incomplete_bars_are_dropped() {
        let body = r#"{
            "chart": {
                "result": [{
                    "timestamp": [1704207600, 1704294000],
                    "indicators": {
                        "quote": [{
                            "open": [149.0, null],
                            "high": [151.0, null],
                            "low": [148.0, null],
                            "close": [150.0, null],
                            "volume": [1000, null]
                        }]
                    }
                }],
                "error": null
            }
        }"#;
        let mock_server = create_mock_server("AAPL", body).await;
        let cache = Arc::new(Cache::new());

        let provider = YahooHistoryProvider::new(&mock_server.uri(), cache);
        let outcome = provider.fetch_history("AAPL").await;

        let series = outcome.series().expect("expected a series");
        assert_eq!(series.len(), 1);
        assert_eq!(series.bars[0].close, 150.0);
    }

    #[tokio::test]
    async fn test_unknown_symbol_returns_no_data() {
        let body = r#"{
            "chart": {
                "result": null,
                "error": {
                    "code": "Not Found",
                    "description": "No data found, symbol may be delisted"
                }
            }
        }"#;
        let mock_server = create_mock_server("NOTREAL", body).await;
        let cache = Arc::new(Cache::new());

        let provider = YahooHistoryProvider::new(&mock_server.uri(), cache);
        match provider.fetch_history("NOTREAL").await {
            HistoryOutcome::NoData { reason } => {
                assert!(reason.contains("No data found, symbol may be delisted"));
            }
            HistoryOutcome::Series(_) => panic!("expected NoData"),
        }
    }

    #[tokio::test]
    async fn test_server_error_returns_no_data() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v8/finance/chart/AAPL"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let cache = Arc::new(Cache::new());
        let provider = YahooHistoryProvider::new(&mock_server.uri(), cache);

        match provider.fetch_history("AAPL").await {
            HistoryOutcome::NoData { reason } => {
                assert!(reason.starts_with("HTTP error: 500"));
            }
            HistoryOutcome::Series(_) => panic!("expected NoData"),
        }
    }

    #[tokio::test]
    async fn test_malformed_response_returns_no_data() {
        let mock_server = create_mock_server("AAPL", r#"{"chart": {"results": []}}"#).await;
        let cache = Arc::new(Cache::new());

        let provider = YahooHistoryProvider::new(&mock_server.uri(), cache);
        match provider.fetch_history("AAPL").await {
            HistoryOutcome::NoData { reason } => {
                assert!(reason.contains("No history data found for symbol: AAPL"));
            }
            HistoryOutcome::Series(_) => panic!("expected NoData"),
        }
    }

    #[tokio::test]
    async fn test_empty_history_returns_no_data() {
        let body = chart_body(&[], &[]);
        let mock_server = create_mock_server("AAPL", &body).await;
        let cache = Arc::new(Cache::new());

        let provider = YahooHistoryProvider::new(&mock_server.uri(), cache);
        match provider.fetch_history("AAPL").await {
            HistoryOutcome::NoData { reason } => {
                assert!(reason.contains("Empty price history"));
            }
            HistoryOutcome::Series(_) => panic!("expected NoData"),
        }
    }

    #[tokio::test]
    async fn test_history_fetch_is_memoized_per_symbol() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v8/finance/chart/AAPL"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(chart_body(&[1704207600], &[150.0])),
            )
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v8/finance/chart/MSFT"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(chart_body(&[1704207600], &[400.0])),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let cache = Arc::new(Cache::new());
        let provider = YahooHistoryProvider::new(&mock_server.uri(), cache);

        let first = provider.fetch_history("AAPL").await;
        let second = provider.fetch_history("AAPL").await;
        assert_eq!(first, second);

        let other = provider.fetch_history("MSFT").await;
        assert_eq!(other.series().unwrap().bars[0].close, 400.0);
    }

    #[tokio::test]
    async fn test_no_data_outcome_is_memoized() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v8/finance/chart/NOTREAL"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&mock_server)
            .await;

        let cache = Arc::new(Cache::new());
        let provider = YahooHistoryProvider::new(&mock_server.uri(), cache);

        let first = provider.fetch_history("NOTREAL").await;
        let second = provider.fetch_history("NOTREAL").await;
        assert_eq!(first, second);
        assert!(first.series().is_none());
    }
}
