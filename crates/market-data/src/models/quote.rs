use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Normalized latest quote for a symbol.
///
/// Quotes are never mutated after construction; a refresh produces a new
/// value that replaces the cached one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// Uppercase, trimmed symbol
    pub symbol: String,

    /// Current/last traded price
    pub price: Decimal,

    /// Absolute change against the previous close
    pub change: Decimal,

    /// Percentage change against the previous close
    pub change_percent: Decimal,

    /// Session volume
    pub volume: Decimal,

    pub high: Decimal,
    pub low: Decimal,
    pub open: Decimal,
    pub previous_close: Decimal,

    /// Time of the quote, epoch milliseconds on the wire
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,

    /// Provider that answered (YAHOO, FINNHUB, ALPHA_VANTAGE, ...)
    pub source: String,
}

impl Quote {
    /// Derive `change` and `change_percent` from price and previous close.
    ///
    /// Providers that report both values natively should use them instead.
    pub fn derive_change(price: Decimal, previous_close: Decimal) -> (Decimal, Decimal) {
        let change = price - previous_close;
        let change_percent = if previous_close.is_zero() {
            Decimal::ZERO
        } else {
            change / previous_close * Decimal::ONE_HUNDRED
        };
        (change, change_percent)
    }
}

/// One OHLCV bar of a historical series.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoricalPoint {
    /// Start of the trading period, epoch milliseconds on the wire
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub date: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}
