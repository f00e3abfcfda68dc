// =============================================================================
// Yahoo Finance chart client — daily bars over HTTP
// =============================================================================
//
// GET /v8/finance/chart/{symbol}?period1=..&period2=..&interval=1d
//
// The response carries parallel arrays (timestamp, open, high, low, close,
// volume) where any OHLC slot may be null on halted or partial sessions.
// Such rows are dropped rather than filled.
// =============================================================================

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::provider::window_start;
use super::{MarketDataProvider, PricePoint, PriceSeries};

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Yahoo Finance chart API client (public, unauthenticated).
#[derive(Clone)]
pub struct YahooClient {
    base_url: String,
    client: reqwest::Client,
}

impl YahooClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Point the client at another host (a mirror or a local stub).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static("kscan/0.1"));

        let client = reqwest::Client::builder()
            .default_headers(default_headers)
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .context("failed to build reqwest client")?;

        let base_url = base_url.into();
        debug!(base_url = %base_url, "YahooClient initialised");

        Ok(Self { base_url, client })
    }

    /// GET /v8/finance/chart/{symbol}.
    #[instrument(skip(self), name = "yahoo::get_chart")]
    pub async fn get_chart(
        &self,
        symbol: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        interval: &str,
    ) -> Result<Vec<PricePoint>> {
        let url = format!(
            "{}/v8/finance/chart/{}?period1={}&period2={}&interval={}",
            self.base_url,
            symbol,
            from.timestamp(),
            to.timestamp(),
            interval
        );

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .context("GET /v8/finance/chart request failed")?;

        let status = resp.status();
        let body: Value = resp
            .json()
            .await
            .context("failed to parse chart response")?;

        if !status.is_success() {
            anyhow::bail!("Yahoo GET /v8/finance/chart returned {}: {}", status, body);
        }

        let points = parse_chart(&body)?;
        debug!(symbol, interval, count = points.len(), "chart fetched");
        Ok(points)
    }
}

#[async_trait]
impl MarketDataProvider for YahooClient {
    fn name(&self) -> &str {
        "yahoo"
    }

    async fn fetch_series(
        &self,
        symbol: &str,
        lookback_days: u32,
        interval: &str,
    ) -> Result<PriceSeries> {
        let to = Utc::now();
        let from = window_start(to, lookback_days)?;
        let points = self.get_chart(symbol, from, to, interval).await?;
        Ok(PriceSeries::from_unordered(symbol, points))
    }
}

/// Convert a chart response body into bars, dropping rows with a null or
/// non-numeric OHLC value.
pub fn parse_chart(body: &Value) -> Result<Vec<PricePoint>> {
    let chart = body.get("chart").context("chart response has no 'chart' field")?;

    if let Some(err) = chart.get("error").filter(|e| !e.is_null()) {
        anyhow::bail!("chart error: {}", err);
    }

    let result = chart
        .get("result")
        .and_then(|r| r.as_array())
        .and_then(|r| r.first())
        .context("chart response has no result")?;

    // A symbol with no trading days has no timestamp array at all.
    let Some(timestamps) = result.get("timestamp").and_then(|t| t.as_array()) else {
        return Ok(Vec::new());
    };

    let quote = result
        .get("indicators")
        .and_then(|i| i.get("quote"))
        .and_then(|q| q.as_array())
        .and_then(|q| q.first())
        .context("chart result has no quote block")?;

    let opens = quote_column(quote, "open")?;
    let highs = quote_column(quote, "high")?;
    let lows = quote_column(quote, "low")?;
    let closes = quote_column(quote, "close")?;
    let volumes = quote.get("volume").and_then(|v| v.as_array());

    let mut points = Vec::with_capacity(timestamps.len());
    let mut dropped = 0usize;

    for (i, ts) in timestamps.iter().enumerate() {
        let Some(timestamp) = ts.as_i64().and_then(|s| DateTime::from_timestamp(s, 0)) else {
            dropped += 1;
            continue;
        };
        let at = |col: &Vec<Value>| col.get(i).and_then(|v| v.as_f64());
        let (Some(open), Some(high), Some(low), Some(close)) =
            (at(opens), at(highs), at(lows), at(closes))
        else {
            dropped += 1;
            continue;
        };
        let volume = volumes.and_then(at).unwrap_or(0.0);
        points.push(PricePoint::new(timestamp, open, high, low, close, volume));
    }

    if dropped > 0 {
        warn!(dropped, kept = points.len(), "dropped incomplete chart rows");
    }

    Ok(points)
}

fn quote_column<'a>(quote: &'a Value, name: &str) -> Result<&'a Vec<Value>> {
    quote
        .get(name)
        .and_then(|c| c.as_array())
        .with_context(|| format!("quote block has no '{name}' array"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rows_and_drops_nulls() {
        let body = serde_json::json!({
            "chart": {
                "result": [{
                    "timestamp": [1700000000, 1700086400, 1700172800],
                    "indicators": { "quote": [{
                        "open":   [10.0, null, 12.0],
                        "high":   [11.0, 12.0, 13.0],
                        "low":    [9.5, 10.5, 11.5],
                        "close":  [10.5, 11.5, 12.5],
                        "volume": [1000, 2000, null]
                    }]}
                }],
                "error": null
            }
        });
        let points = parse_chart(&body).unwrap();
        assert_eq!(points.len(), 2);
        assert!((points[0].close - 10.5).abs() < 1e-12);
        assert!((points[0].volume - 1000.0).abs() < 1e-12);
        assert!((points[1].close - 12.5).abs() < 1e-12);
        assert_eq!(points[1].volume, 0.0);
        assert_eq!(points[1].timestamp.timestamp(), 1_700_172_800);
    }

    #[test]
    fn empty_result_without_timestamps() {
        let body = serde_json::json!({
            "chart": { "result": [{ "indicators": { "quote": [{}] } }], "error": null }
        });
        assert!(parse_chart(&body).unwrap().is_empty());
    }

    #[test]
    fn chart_error_is_reported() {
        let body = serde_json::json!({
            "chart": { "result": null, "error": { "code": "Not Found" } }
        });
        let err = parse_chart(&body).unwrap_err();
        assert!(err.to_string().contains("Not Found"));
    }

    #[test]
    fn missing_chart_is_error() {
        assert!(parse_chart(&serde_json::json!({})).is_err());
    }
}
