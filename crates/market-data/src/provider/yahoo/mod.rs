//! Yahoo Finance market data provider.
//!
//! Uses the chart API through `yahoo_finance_api` for both the latest quote
//! and historical bars. The latest quote is the most recent daily bar of a
//! short range, with the previous bar supplying the previous close.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use num_traits::FromPrimitive;
use rust_decimal::Decimal;
use tracing::{debug, warn};
use yahoo_finance_api as yahoo;

use crate::errors::MarketDataError;
use crate::models::{HistoricalPoint, Interval, Period, Quote};
use crate::provider::{MarketDataProvider, DEFAULT_PROVIDER_TIMEOUT};

const PROVIDER_ID: &str = "YAHOO";

/// Range requested for the latest quote; long enough to span a weekend plus a holiday.
const LATEST_RANGE: &str = "5d";

/// Yahoo Finance market data provider.
pub struct YahooProvider {
    connector: yahoo::YahooConnector,
    timeout: Duration,
}

impl YahooProvider {
    /// Create a new Yahoo Finance provider.
    pub fn new() -> Result<Self, MarketDataError> {
        Self::with_timeout(DEFAULT_PROVIDER_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, MarketDataError> {
        let connector = yahoo::YahooConnector::new().map_err(|e| {
            MarketDataError::provider_error(
                PROVIDER_ID,
                format!("Failed to initialize Yahoo connector: {}", e),
            )
        })?;
        Ok(Self { connector, timeout })
    }

    async fn fetch_bars(
        &self,
        symbol: &str,
        interval: &str,
        range: &str,
    ) -> Result<Vec<HistoricalPoint>, MarketDataError> {
        let response = self
            .connector
            .get_quote_range(symbol, interval, range)
            .await
            .map_err(|e| map_yahoo_error(symbol, e))?;

        let yahoo_quotes = response.quotes().map_err(|e| map_yahoo_error(symbol, e))?;

        let mut points: Vec<HistoricalPoint> = yahoo_quotes
            .into_iter()
            .filter_map(|q| {
                let point = bar_to_point(
                    q.timestamp as i64,
                    q.open,
                    q.high,
                    q.low,
                    q.close,
                    q.volume as u64,
                );
                if point.is_none() {
                    warn!("Skipping Yahoo bar for {} at {}", symbol, q.timestamp);
                }
                point
            })
            .collect();

        points.sort_by(|a, b| a.date.cmp(&b.date));

        if points.is_empty() {
            return Err(MarketDataError::NoDataForRange);
        }

        Ok(points)
    }
}

fn map_yahoo_error(symbol: &str, e: yahoo::YahooError) -> MarketDataError {
    if matches!(e, yahoo::YahooError::NoQuotes | yahoo::YahooError::NoResult) {
        MarketDataError::SymbolNotFound(symbol.to_string())
    } else {
        MarketDataError::provider_error(PROVIDER_ID, e.to_string())
    }
}

/// Convert one raw chart bar. Bars with NaN prices (halted sessions) are dropped.
fn bar_to_point(
    timestamp: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: u64,
) -> Option<HistoricalPoint> {
    Some(HistoricalPoint {
        date: Utc.timestamp_opt(timestamp, 0).single()?,
        open: Decimal::from_f64(open)?,
        high: Decimal::from_f64(high)?,
        low: Decimal::from_f64(low)?,
        close: Decimal::from_f64(close)?,
        volume: Decimal::from_u64(volume)?,
    })
}

/// Build the latest quote from the last two daily bars.
fn latest_from_bars(symbol: &str, bars: &[HistoricalPoint]) -> Result<Quote, MarketDataError> {
    let last = bars
        .last()
        .ok_or_else(|| MarketDataError::SymbolNotFound(symbol.to_string()))?;

    let previous_close = bars
        .len()
        .checked_sub(2)
        .and_then(|i| bars.get(i))
        .map(|p| p.close)
        .unwrap_or(last.open);

    let (change, change_percent) = Quote::derive_change(last.close, previous_close);

    Ok(Quote {
        symbol: symbol.to_string(),
        price: last.close,
        change,
        change_percent,
        volume: last.volume,
        high: last.high,
        low: last.low,
        open: last.open,
        previous_close,
        timestamp: last.date,
        source: PROVIDER_ID.to_string(),
    })
}

#[async_trait]
impl MarketDataProvider for YahooProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn get_latest_quote(&self, symbol: &str) -> Result<Quote, MarketDataError> {
        debug!("Fetching latest quote for {} from Yahoo", symbol);
        let bars = self.fetch_bars(symbol, "1d", LATEST_RANGE).await?;
        latest_from_bars(symbol, &bars)
    }

    async fn get_historical_quotes(
        &self,
        symbol: &str,
        period: Period,
        interval: Interval,
    ) -> Result<Vec<HistoricalPoint>, MarketDataError> {
        debug!(
            "Fetching historical quotes for {} ({} / {}) from Yahoo",
            symbol, period, interval
        );
        self.fetch_bars(symbol, interval.as_str(), period.as_str())
            .await
    }
}
