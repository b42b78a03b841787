//! Market data provider abstractions and implementations.
//!
//! This module contains:
//! - The `MarketDataProvider` trait that all providers implement
//! - Concrete provider implementations (Yahoo, Finnhub, Alpha Vantage)
//!
//! Providers receive symbols that are already normalized. Each provider maps
//! its native payload onto [`Quote`](crate::models::Quote) and
//! [`HistoricalPoint`](crate::models::HistoricalPoint); nothing
//! provider-specific crosses this module's boundary.

mod traits;

pub mod alpha_vantage;
pub mod finnhub;
pub mod yahoo;

pub use traits::{MarketDataProvider, DEFAULT_PROVIDER_TIMEOUT};
