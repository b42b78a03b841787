//! MarketPulse Market Data Crate
//!
//! Provider-agnostic fetching of latest quotes and historical bars.
//!
//! # Overview
//!
//! - Multiple providers: Yahoo Finance, Finnhub, Alpha Vantage
//! - One normalized shape for quotes and bars, whatever the source
//! - A fixed-order fallback chain that absorbs per-provider failures
//!
//! # Architecture
//!
//! ```text
//! +------------------+
//! |  caller symbol   |  ("aapl")
//! +------------------+
//!          |
//!          v  normalize_symbol
//! +------------------+
//! | ProviderRegistry |  (fallback chain, registration order)
//! +------------------+
//!          |
//!          v  fetch_quote / fetch_historical (timeout, errors -> None)
//! +------------------+
//! |    Provider      |  (Yahoo, Finnhub, AlphaVantage)
//! +------------------+
//!          |
//!          v
//! +------------------+
//! | Quote / History  |  (normalized, tagged with source)
//! +------------------+
//! ```
//!
//! # Core Types
//!
//! - [`Quote`] - Latest quote with change, OHLC and previous close
//! - [`HistoricalPoint`] - One OHLCV bar
//! - [`Period`] / [`Interval`] - Historical request window and bar width
//! - [`MarketDataProvider`] - Provider trait
//! - [`ProviderRegistry`] - Fallback resolver

pub mod errors;
pub mod models;
pub mod provider;
pub mod registry;

pub use errors::{MarketDataError, Operation};

pub use models::{normalize_symbol, HistoricalPoint, Interval, Period, Quote};

pub use provider::alpha_vantage::AlphaVantageProvider;
pub use provider::finnhub::FinnhubProvider;
pub use provider::yahoo::YahooProvider;
pub use provider::{MarketDataProvider, DEFAULT_PROVIDER_TIMEOUT};

pub use registry::ProviderRegistry;
