//! Technical indicators and market analysis over historical price series.
//!
//! All math here is pure `f64` over close (or low/high) series ordered oldest
//! first. Insufficient history is never an error: indicators return `None`,
//! trend falls back to [`Trend::Unknown`](analysis::Trend::Unknown) and
//! volatility to `0.0`.

pub mod analysis;
pub mod indicators;

mod stats;

pub use analysis::{closes, resistance, support, trend, volatility, Trend};
pub use indicators::{
    bollinger_bands, ema, macd, rsi, sma, BollingerBands, Macd, TechnicalIndicators,
};
