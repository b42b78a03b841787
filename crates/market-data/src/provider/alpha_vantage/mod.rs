//! Alpha Vantage market data provider implementation.
//!
//! This module provides market data from Alpha Vantage API:
//! - Latest quotes via GLOBAL_QUOTE
//! - Historical bars via TIME_SERIES_INTRADAY / DAILY / WEEKLY / MONTHLY
//!
//! Note: Alpha Vantage free tier is limited to 5 API calls per minute, and
//! signals throttling through a "Note"/"Information" field with HTTP 200.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use log::{debug, warn};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::MarketDataError;
use crate::models::{HistoricalPoint, Interval, Period, Quote};
use crate::provider::{MarketDataProvider, DEFAULT_PROVIDER_TIMEOUT};

const BASE_URL: &str = "https://www.alphavantage.co/query";
const PROVIDER_ID: &str = "ALPHA_VANTAGE";

/// Compact output holds the latest 100 bars; longer windows need `full`.
const COMPACT_MAX_DAYS: i64 = 100;

/// Alpha Vantage market data provider.
pub struct AlphaVantageProvider {
    client: Client,
    api_key: String,
    timeout: Duration,
}

// ============================================================================
// Response structures for Alpha Vantage API
// ============================================================================

#[derive(Debug, Deserialize)]
struct GlobalQuoteResponse {
    #[serde(rename = "Global Quote")]
    global_quote: Option<Value>,
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GlobalQuote {
    #[serde(rename = "02. open")]
    open: String,
    #[serde(rename = "03. high")]
    high: String,
    #[serde(rename = "04. low")]
    low: String,
    #[serde(rename = "05. price")]
    price: String,
    #[serde(rename = "06. volume")]
    volume: String,
    #[serde(rename = "07. latest trading day")]
    latest_trading_day: String,
    #[serde(rename = "08. previous close")]
    previous_close: String,
    #[serde(rename = "09. change")]
    change: String,
    #[serde(rename = "10. change percent")]
    change_percent: String,
}

#[derive(Debug, Deserialize)]
struct Bar {
    #[serde(rename = "1. open")]
    open: String,
    #[serde(rename = "2. high")]
    high: String,
    #[serde(rename = "3. low")]
    low: String,
    #[serde(rename = "4. close")]
    close: String,
    #[serde(rename = "5. volume", default)]
    volume: Option<String>,
}

impl AlphaVantageProvider {
    /// Create a new Alpha Vantage provider with the given API key.
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

    async fn fetch(&self, params: &[(&str, &str)]) -> Result<String, MarketDataError> {
        let response = self
            .client
            .get(BASE_URL)
            .query(params)
            .query(&[("apikey", self.api_key.as_str())])
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

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(MarketDataError::RateLimited {
                provider: PROVIDER_ID.to_string(),
            });
        }

        if !response.status().is_success() {
            return Err(MarketDataError::provider_error(
                PROVIDER_ID,
                format!("HTTP {}", response.status()),
            ));
        }

        response.text().await.map_err(|e| {
            MarketDataError::provider_error(PROVIDER_ID, format!("Failed to read response: {}", e))
        })
    }

    fn parse_global_quote(symbol: &str, text: &str) -> Result<Quote, MarketDataError> {
        let response: GlobalQuoteResponse = serde_json::from_str(text).map_err(|e| {
            MarketDataError::provider_error(
                PROVIDER_ID,
                format!("Failed to parse GLOBAL_QUOTE response: {}", e),
            )
        })?;

        check_api_messages(
            response.error_message,
            response.note,
            response.information,
            symbol,
        )?;

        // Unknown symbols come back as an empty "Global Quote" object
        let raw = response
            .global_quote
            .filter(|v| v.as_object().is_some_and(|o| !o.is_empty()))
            .ok_or_else(|| MarketDataError::SymbolNotFound(symbol.to_string()))?;
        let quote: GlobalQuote = serde_json::from_value(raw).map_err(|e| {
            MarketDataError::provider_error(PROVIDER_ID, format!("Incomplete quote: {}", e))
        })?;

        let timestamp = NaiveDate::parse_from_str(&quote.latest_trading_day, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
            .unwrap_or_else(Utc::now);

        Ok(Quote {
            symbol: symbol.to_string(),
            price: parse_decimal(&quote.price)?,
            change: parse_decimal(&quote.change)?,
            change_percent: parse_decimal(quote.change_percent.trim_end_matches('%'))?,
            volume: parse_decimal(&quote.volume)?,
            high: parse_decimal(&quote.high)?,
            low: parse_decimal(&quote.low)?,
            open: parse_decimal(&quote.open)?,
            previous_close: parse_decimal(&quote.previous_close)?,
            timestamp,
            source: PROVIDER_ID.to_string(),
        })
    }

    fn parse_time_series(
        symbol: &str,
        text: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<HistoricalPoint>, MarketDataError> {
        let mut body: HashMap<String, Value> = serde_json::from_str(text).map_err(|e| {
            MarketDataError::provider_error(
                PROVIDER_ID,
                format!("Failed to parse time series response: {}", e),
            )
        })?;

        let message = |key: &str| body.get(key).and_then(Value::as_str).map(str::to_string);
        check_api_messages(
            message("Error Message"),
            message("Note"),
            message("Information"),
            symbol,
        )?;

        // The series key varies: "Time Series (Daily)", "Weekly Time Series", "Time Series (5min)"
        let series_key = body
            .keys()
            .find(|k| k.contains("Time Series"))
            .cloned()
            .ok_or(MarketDataError::NoDataForRange)?;

        let series: HashMap<String, Bar> = body
            .remove(&series_key)
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| {
                MarketDataError::provider_error(
                    PROVIDER_ID,
                    format!("Failed to parse bars: {}", e),
                )
            })?
            .unwrap_or_default();

        let mut points: Vec<HistoricalPoint> = series
            .into_iter()
            .filter_map(|(key, bar)| {
                let Some(date) = parse_bar_date(&key) else {
                    warn!("Skipping bar with invalid date '{}' for {}", key, symbol);
                    return None;
                };
                if date < since {
                    return None;
                }
                match bar_to_point(date, &bar) {
                    Ok(point) => Some(point),
                    Err(e) => {
                        warn!("Skipping bar {} for {}: {}", key, symbol, e);
                        None
                    }
                }
            })
            .collect();

        points.sort_by(|a, b| a.date.cmp(&b.date));

        if points.is_empty() {
            return Err(MarketDataError::NoDataForRange);
        }

        Ok(points)
    }
}

fn check_api_messages(
    error_message: Option<String>,
    note: Option<String>,
    information: Option<String>,
    symbol: &str,
) -> Result<(), MarketDataError> {
    if let Some(msg) = error_message {
        debug!("Alpha Vantage error for {}: {}", symbol, msg);
        return Err(MarketDataError::SymbolNotFound(symbol.to_string()));
    }
    if note.is_some() || information.is_some() {
        return Err(MarketDataError::RateLimited {
            provider: PROVIDER_ID.to_string(),
        });
    }
    Ok(())
}

/// Map an interval to the time series function and its intraday width.
fn series_function(interval: Interval) -> (&'static str, Option<&'static str>) {
    match interval {
        Interval::OneMinute => ("TIME_SERIES_INTRADAY", Some("1min")),
        Interval::FiveMinutes => ("TIME_SERIES_INTRADAY", Some("5min")),
        Interval::FifteenMinutes => ("TIME_SERIES_INTRADAY", Some("15min")),
        Interval::ThirtyMinutes => ("TIME_SERIES_INTRADAY", Some("30min")),
        Interval::OneHour => ("TIME_SERIES_INTRADAY", Some("60min")),
        Interval::OneDay => ("TIME_SERIES_DAILY", None),
        Interval::OneWeek => ("TIME_SERIES_WEEKLY", None),
        Interval::OneMonth => ("TIME_SERIES_MONTHLY", None),
    }
}

fn parse_bar_date(key: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(key, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(key, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn bar_to_point(date: DateTime<Utc>, bar: &Bar) -> Result<HistoricalPoint, MarketDataError> {
    Ok(HistoricalPoint {
        date,
        open: parse_decimal(&bar.open)?,
        high: parse_decimal(&bar.high)?,
        low: parse_decimal(&bar.low)?,
        close: parse_decimal(&bar.close)?,
        volume: bar
            .volume
            .as_deref()
            .map(parse_decimal)
            .transpose()?
            .unwrap_or(Decimal::ZERO),
    })
}

fn parse_decimal(value: &str) -> Result<Decimal, MarketDataError> {
    Decimal::from_str(value.trim()).map_err(|_| {
        MarketDataError::provider_error(PROVIDER_ID, format!("Invalid number: '{}'", value))
    })
}

#[async_trait]
impl MarketDataProvider for AlphaVantageProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn get_latest_quote(&self, symbol: &str) -> Result<Quote, MarketDataError> {
        let text = self
            .fetch(&[("function", "GLOBAL_QUOTE"), ("symbol", symbol)])
            .await?;
        Self::parse_global_quote(symbol, &text)
    }

    async fn get_historical_quotes(
        &self,
        symbol: &str,
        period: Period,
        interval: Interval,
    ) -> Result<Vec<HistoricalPoint>, MarketDataError> {
        let now = Utc::now();
        let since = period.start_from(now);
        let (function, intraday) = series_function(interval);
        let output_size =
            if (now - since).num_days() > COMPACT_MAX_DAYS || interval.is_intraday() {
                "full"
            } else {
                "compact"
            };

        let mut params = vec![
            ("function", function),
            ("symbol", symbol),
            ("outputsize", output_size),
        ];
        if let Some(width) = intraday {
            params.push(("interval", width));
        }

        let text = self.fetch(&params).await?;
        let points = Self::parse_time_series(symbol, &text, since)?;

        debug!(
            "Alpha Vantage: fetched {} bars for {} ({} / {})",
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
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn test_provider_id() {
        let provider = AlphaVantageProvider::new("test_key".to_string());
        assert_eq!(provider.id(), "ALPHA_VANTAGE");
    }

    #[test]
    fn test_parse_global_quote() {
        let json = r#"{
            "Global Quote": {
                "01. symbol": "IBM",
                "02. open": "187.1500",
                "03. high": "188.4400",
                "04. low": "186.5000",
                "05. price": "187.9000",
                "06. volume": "3257218",
                "07. latest trading day": "2024-01-05",
                "08. previous close": "186.8600",
                "09. change": "1.0400",
                "10. change percent": "0.5566%"
            }
        }"#;

        let quote = AlphaVantageProvider::parse_global_quote("IBM", json).unwrap();
        assert_eq!(quote.price, dec!(187.90));
        assert_eq!(quote.change, dec!(1.04));
        assert_eq!(quote.change_percent, dec!(0.5566));
        assert_eq!(quote.volume, dec!(3257218));
        assert_eq!(quote.open, dec!(187.15));
        assert_eq!(quote.high, dec!(188.44));
        assert_eq!(quote.low, dec!(186.50));
        assert_eq!(quote.previous_close, dec!(186.86));
        assert_eq!(
            quote.timestamp,
            Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap()
        );
        assert_eq!(quote.source, "ALPHA_VANTAGE");
    }

    #[test]
    fn test_parse_global_quote_empty_is_not_found() {
        let json = r#"{"Global Quote": {}}"#;
        let result = AlphaVantageProvider::parse_global_quote("ZZZZ", json);
        assert!(matches!(result, Err(MarketDataError::SymbolNotFound(_))));
    }

    #[test]
    fn test_rate_limit_note() {
        let json = r#"{"Note": "Thank you for using Alpha Vantage! Our standard API call frequency is 5 calls per minute."}"#;
        let result = AlphaVantageProvider::parse_global_quote("IBM", json);
        assert!(matches!(result, Err(MarketDataError::RateLimited { .. })));
    }

    #[test]
    fn test_parse_daily_series_filters_and_sorts() {
        let json = r#"{
            "Meta Data": {"2. Symbol": "IBM"},
            "Time Series (Daily)": {
                "2024-01-05": {"1. open": "187.15", "2. high": "188.44", "3. low": "186.50", "4. close": "187.90", "5. volume": "3257218"},
                "2024-01-04": {"1. open": "185.00", "2. high": "187.00", "3. low": "184.80", "4. close": "186.86", "5. volume": "3100000"},
                "2023-06-01": {"1. open": "130.00", "2. high": "131.00", "3. low": "129.00", "4. close": "130.50", "5. volume": "1000"}
            }
        }"#;

        let since = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let points = AlphaVantageProvider::parse_time_series("IBM", json, since).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].close, dec!(186.86));
        assert_eq!(points[1].close, dec!(187.90));
        assert_eq!(points[1].volume, dec!(3257218));
    }

    #[test]
    fn test_parse_intraday_date() {
        let date = parse_bar_date("2024-01-05 15:55:00").unwrap();
        assert_eq!(date, Utc.with_ymd_and_hms(2024, 1, 5, 15, 55, 0).unwrap());
    }

    #[test]
    fn test_error_message_is_not_found() {
        let json = r#"{"Error Message": "Invalid API call."}"#;
        let result = AlphaVantageProvider::parse_time_series("ZZZZ", json, Utc::now());
        assert!(matches!(result, Err(MarketDataError::SymbolNotFound(_))));
    }

    #[test]
    fn test_series_function_mapping() {
        assert_eq!(series_function(Interval::OneDay), ("TIME_SERIES_DAILY", None));
        assert_eq!(
            series_function(Interval::FiveMinutes),
            ("TIME_SERIES_INTRADAY", Some("5min"))
        );
    }
}
