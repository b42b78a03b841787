//! Provider registry module.
//!
//! This module provides orchestration for market data providers: the
//! fixed-order fallback chain that turns many "no data" answers into one
//! result or one `NoDataAvailable` error.

mod registry;

pub use registry::ProviderRegistry;
