//! Benchmark sets and the aggregate shapes built from them.

use rust_decimal::Decimal;
use serde::Serialize;

use marketpulse_analytics::{TechnicalIndicators, Trend};
use marketpulse_market_data::Quote;

/// Broad-market ETFs reported by `get_market_indices`.
pub const MARKET_INDICES: [&str; 5] = ["SPY", "QQQ", "DIA", "IWM", "VTI"];

/// Sector name to the SPDR sector ETF that tracks it.
pub const SECTOR_ETFS: [(&str, &str); 11] = [
    ("Technology", "XLK"),
    ("Healthcare", "XLV"),
    ("Financials", "XLF"),
    ("Energy", "XLE"),
    ("Consumer Discretionary", "XLY"),
    ("Consumer Staples", "XLP"),
    ("Industrials", "XLI"),
    ("Materials", "XLB"),
    ("Real Estate", "XLRE"),
    ("Utilities", "XLU"),
    ("Communication Services", "XLC"),
];

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectorPerformance {
    pub symbol: String,
    pub price: Decimal,
    pub change: Decimal,
    pub change_percent: Decimal,
}

impl From<&Quote> for SectorPerformance {
    fn from(quote: &Quote) -> Self {
        Self {
            symbol: quote.symbol.clone(),
            price: quote.price,
            change: quote.change,
            change_percent: quote.change_percent,
        }
    }
}

/// Quote, indicators and derived classifications for one symbol.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketAnalysis {
    pub quote: Quote,
    pub indicators: TechnicalIndicators,
    pub trend: Trend,
    /// Annualized, in percent.
    pub volatility: f64,
    pub support: Option<f64>,
    pub resistance: Option<f64>,
}
