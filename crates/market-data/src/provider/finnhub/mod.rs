//! Finnhub market data provider implementation.
//!
//! - Latest quotes via the /quote endpoint
//! - Daily/intraday candles via the /stock/candle endpoint
//!
//! Finnhub free tier is limited to 60 API calls per minute.
//! API documentation: https://finnhub.io/docs/api

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::errors::MarketDataError;
use crate::models::{HistoricalPoint, Interval, Period, Quote};
use crate::provider::{MarketDataProvider, DEFAULT_PROVIDER_TIMEOUT};

const BASE_URL: &str = "https://finnhub.io/api/v1";
const PROVIDER_ID: &str = "FINNHUB";

// ============================================================================
// API Response Structures
// ============================================================================

/// Response from /quote endpoint
#[derive(Debug, Deserialize)]
struct QuoteResponse {
    /// Current price
    c: Option<f64>,
    /// Change
    d: Option<f64>,
    /// Percent change
    dp: Option<f64>,
    /// High price of the day
    h: Option<f64>,
    /// Low price of the day
    l: Option<f64>,
    /// Open price of the day
    o: Option<f64>,
    /// Previous close price
    pc: Option<f64>,
    /// Timestamp (Unix)
    t: Option<i64>,
}

/// Response from /stock/candle endpoint
#[derive(Debug, Deserialize)]
struct CandleResponse {
    /// Status: "ok" or "no_data"
    s: String,
    #[serde(default)]
    c: Vec<f64>,
    #[serde(default)]
    h: Vec<f64>,
    #[serde(default)]
    l: Vec<f64>,
    #[serde(default)]
    o: Vec<f64>,
    #[serde(default)]
    v: Vec<f64>,
    #[serde(default)]
    t: Vec<i64>,
}

/// Error response from Finnhub
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: Option<String>,
}

// ============================================================================
// FinnhubProvider
// ============================================================================

/// Finnhub market data provider.
pub struct FinnhubProvider {
    client: Client,
    api_key: String,
    timeout: Duration,
}

impl FinnhubProvider {
    /// Create a new Finnhub provider with the given API key.
    pub fn new(api_key: String) -> Self {
        Self::with_timeout(api_key, DEFAULT_PROVIDER_TIMEOUT)
    }

    pub fn with_timeout(api_key: String, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            api_key,
            timeout,
        }
    }

    /// Make a GET request to the Finnhub API.
    async fn fetch(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<String, MarketDataError> {
        let url = format!("{}{}", BASE_URL, endpoint);

        debug!("Finnhub request: {} with {} params", endpoint, params.len());

        let response = self
            .client
            .get(&url)
            .header("X-Finnhub-Token", &self.api_key)
            .query(params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    MarketDataError::Timeout {
                        provider: PROVIDER_ID.to_string(),
                    }
                } else {
                    MarketDataError::Network(e)
                }
            })?;

        let status = response.status();

        // 403 is returned once the plan quota is exhausted
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS
            || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(MarketDataError::RateLimited {
                provider: PROVIDER_ID.to_string(),
            });
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(MarketDataError::provider_error(
                PROVIDER_ID,
                "Invalid or missing API key",
            ));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();

            if let Ok(ErrorResponse { error: Some(msg) }) = serde_json::from_str(&body) {
                return Err(MarketDataError::provider_error(PROVIDER_ID, msg));
            }

            return Err(MarketDataError::provider_error(
                PROVIDER_ID,
                format!("HTTP {} - {}", status, body),
            ));
        }

        response.text().await.map_err(|e| {
            MarketDataError::provider_error(PROVIDER_ID, format!("Failed to read response: {}", e))
        })
    }

    fn parse_quote(symbol: &str, text: &str) -> Result<Quote, MarketDataError> {
        let response: QuoteResponse = serde_json::from_str(text).map_err(|e| {
            MarketDataError::provider_error(
                PROVIDER_ID,
                format!("Failed to parse quote response: {}", e),
            )
        })?;

        let price = response
            .c
            .ok_or_else(|| MarketDataError::SymbolNotFound(symbol.to_string()))?;

        // Finnhub returns zeros for unknown symbols instead of an error
        if price == 0.0 && response.pc.unwrap_or(0.0) == 0.0 {
            return Err(MarketDataError::SymbolNotFound(symbol.to_string()));
        }

        let price = to_decimal(price)?;
        let previous_close = response.pc.map(to_decimal).transpose()?.unwrap_or(price);
        let (derived_change, derived_pct) = Quote::derive_change(price, previous_close);

        let timestamp = response
            .t
            .and_then(|ts| Utc.timestamp_opt(ts, 0).single())
            .unwrap_or_else(Utc::now);

        Ok(Quote {
            symbol: symbol.to_string(),
            price,
            change: response.d.map(to_decimal).transpose()?.unwrap_or(derived_change),
            change_percent: response.dp.map(to_decimal).transpose()?.unwrap_or(derived_pct),
            // /quote does not report volume
            volume: Decimal::ZERO,
            high: response.h.map(to_decimal).transpose()?.unwrap_or(price),
            low: response.l.map(to_decimal).transpose()?.unwrap_or(price),
            open: response.o.map(to_decimal).transpose()?.unwrap_or(price),
            previous_close,
            timestamp,
            source: PROVIDER_ID.to_string(),
        })
    }

    fn parse_candles(text: &str) -> Result<Vec<HistoricalPoint>, MarketDataError> {
        let response: CandleResponse = serde_json::from_str(text).map_err(|e| {
            MarketDataError::provider_error(
                PROVIDER_ID,
                format!("Failed to parse candle response: {}", e),
            )
        })?;

        if response.s == "no_data" {
            return Err(MarketDataError::NoDataForRange);
        }

        if response.s != "ok" {
            return Err(MarketDataError::provider_error(
                PROVIDER_ID,
                format!("Unexpected candle status: {}", response.s),
            ));
        }

        let len = response.t.len();
        if response.c.len() != len
            || response.o.len() != len
            || response.h.len() != len
            || response.l.len() != len
        {
            return Err(MarketDataError::provider_error(
                PROVIDER_ID,
                "Mismatched array lengths in candle response",
            ));
        }

        let mut points = Vec::with_capacity(len);

        for i in 0..len {
            let Some(date) = Utc.timestamp_opt(response.t[i], 0).single() else {
                warn!("Invalid timestamp at index {}: {}", i, response.t[i]);
                continue;
            };

            let bar = (
                Decimal::try_from(response.o[i]),
                Decimal::try_from(response.h[i]),
                Decimal::try_from(response.l[i]),
                Decimal::try_from(response.c[i]),
            );
            let (Ok(open), Ok(high), Ok(low), Ok(close)) = bar else {
                warn!("Skipping candle with non-finite prices at index {}", i);
                continue;
            };

            let volume = response
                .v
                .get(i)
                .and_then(|&v| Decimal::try_from(v).ok())
                .unwrap_or(Decimal::ZERO);

            points.push(HistoricalPoint {
                date,
                open,
                high,
                low,
                close,
                volume,
            });
        }

        points.sort_by(|a, b| a.date.cmp(&b.date));

        if points.is_empty() {
            return Err(MarketDataError::NoDataForRange);
        }

        Ok(points)
    }
}

/// Map an interval to Finnhub's candle resolution.
fn resolution(interval: Interval) -> &'static str {
    match interval {
        Interval::OneMinute => "1",
        Interval::FiveMinutes => "5",
        Interval::FifteenMinutes => "15",
        Interval::ThirtyMinutes => "30",
        Interval::OneHour => "60",
        Interval::OneDay => "D",
        Interval::OneWeek => "W",
        Interval::OneMonth => "M",
    }
}

fn to_decimal(value: f64) -> Result<Decimal, MarketDataError> {
    Decimal::try_from(value).map_err(|_| {
        MarketDataError::provider_error(PROVIDER_ID, format!("Invalid price value: {}", value))
    })
}

#[async_trait]
impl MarketDataProvider for FinnhubProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn get_latest_quote(&self, symbol: &str) -> Result<Quote, MarketDataError> {
        let text = self.fetch("/quote", &[("symbol", symbol)]).await?;
        Self::parse_quote(symbol, &text)
    }

    async fn get_historical_quotes(
        &self,
        symbol: &str,
        period: Period,
        interval: Interval,
    ) -> Result<Vec<HistoricalPoint>, MarketDataError> {
        let end: DateTime<Utc> = Utc::now();
        let from_ts = period.start_from(end).timestamp().to_string();
        let to_ts = end.timestamp().to_string();

        let params = [
            ("symbol", symbol),
            ("resolution", resolution(interval)),
            ("from", from_ts.as_str()),
            ("to", to_ts.as_str()),
        ];

        let text = self.fetch("/stock/candle", &params).await?;
        let points = Self::parse_candles(&text)?;

        debug!(
            "Finnhub: fetched {} candles for {} ({} / {})",
            points.len(),
            symbol,
            period,
            interval
        );

        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_provider_id() {
        let provider = FinnhubProvider::new("test_key".to_string());
        assert_eq!(provider.id(), "FINNHUB");
        assert_eq!(provider.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_resolution_mapping() {
        assert_eq!(resolution(Interval::OneDay), "D");
        assert_eq!(resolution(Interval::OneHour), "60");
        assert_eq!(resolution(Interval::OneWeek), "W");
    }

    #[test]
    fn test_parse_quote_maps_every_field() {
        let json = r#"{
            "c": 150.0,
            "d": 1.5,
            "dp": 1.01,
            "h": 152.0,
            "l": 148.5,
            "o": 149.0,
            "pc": 148.5,
            "t": 1704067200
        }"#;

        let quote = FinnhubProvider::parse_quote("AAPL", json).unwrap();
        assert_eq!(quote.symbol, "AAPL");
        assert_eq!(quote.price, dec!(150));
        assert_eq!(quote.change, dec!(1.5));
        assert_eq!(quote.change_percent, dec!(1.01));
        assert_eq!(quote.high, dec!(152));
        assert_eq!(quote.low, dec!(148.5));
        assert_eq!(quote.open, dec!(149));
        assert_eq!(quote.previous_close, dec!(148.5));
        assert_eq!(quote.timestamp.timestamp(), 1704067200);
        assert_eq!(quote.source, "FINNHUB");
    }

    #[test]
    fn test_parse_quote_unknown_symbol() {
        let json = r#"{"c": 0, "d": null, "dp": null, "h": 0, "l": 0, "o": 0, "pc": 0, "t": 0}"#;
        let result = FinnhubProvider::parse_quote("ZZZZ", json);
        assert!(matches!(result, Err(MarketDataError::SymbolNotFound(_))));
    }

    #[test]
    fn test_parse_candles() {
        let json = r#"{
            "s": "ok",
            "c": [151.0, 150.0, 152.0],
            "h": [152.0, 151.0, 153.0],
            "l": [150.0, 149.0, 151.0],
            "o": [150.5, 149.5, 151.5],
            "v": [1100000, 1000000, 1200000],
            "t": [1704153600, 1704067200, 1704240000]
        }"#;

        let points = FinnhubProvider::parse_candles(json).unwrap();
        assert_eq!(points.len(), 3);
        // sorted oldest first
        assert_eq!(points[0].date.timestamp(), 1704067200);
        assert_eq!(points[0].close, dec!(150));
        assert_eq!(points[0].volume, dec!(1000000));
        assert_eq!(points[2].high, dec!(153));
    }

    #[test]
    fn test_parse_candles_no_data() {
        let result = FinnhubProvider::parse_candles(r#"{"s": "no_data"}"#);
        assert!(matches!(result, Err(MarketDataError::NoDataForRange)));
    }

    #[test]
    fn test_parse_candles_mismatched_lengths() {
        let json = r#"{"s": "ok", "c": [1.0], "h": [], "l": [1.0], "o": [1.0], "t": [1704067200]}"#;
        let result = FinnhubProvider::parse_candles(json);
        assert!(matches!(result, Err(MarketDataError::ProviderError { .. })));
    }
}
