//! Market data provider trait definitions.
//!
//! This module defines the core `MarketDataProvider` trait that all
//! market data providers must implement.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};

use crate::errors::MarketDataError;
use crate::models::{HistoricalPoint, Interval, Period, Quote};

/// Upper bound for a single provider call.
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

/// Trait for market data providers.
///
/// Implementors only write the fallible `get_*` methods. The registry talks
/// to providers through [`fetch_quote`](Self::fetch_quote) and
/// [`fetch_historical`](Self::fetch_historical), which bound each call by
/// [`timeout`](Self::timeout) and turn every failure into `None` so the
/// fallback chain can move on.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use marketpulse_market_data::provider::MarketDataProvider;
///
/// struct MyProvider {
///     api_key: String,
/// }
///
/// #[async_trait]
/// impl MarketDataProvider for MyProvider {
///     fn id(&self) -> &'static str {
///         "MY_PROVIDER"
///     }
///
///     // ... implement quote methods
/// }
/// ```
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Unique identifier for this provider.
    ///
    /// Should be a constant string like "YAHOO", "ALPHA_VANTAGE", etc.
    /// Stamped into `Quote::source` and used for logging.
    fn id(&self) -> &'static str;

    /// Upper bound for one call to this provider.
    fn timeout(&self) -> Duration {
        DEFAULT_PROVIDER_TIMEOUT
    }

    /// Fetch the latest quote for a normalized symbol.
    async fn get_latest_quote(&self, symbol: &str) -> Result<Quote, MarketDataError>;

    /// Fetch a historical series, ordered by date ascending.
    ///
    /// Default implementation returns `NotSupported`.
    async fn get_historical_quotes(
        &self,
        symbol: &str,
        period: Period,
        interval: Interval,
    ) -> Result<Vec<HistoricalPoint>, MarketDataError> {
        let _ = (symbol, period, interval);
        Err(MarketDataError::NotSupported {
            operation: "historical".to_string(),
            provider: self.id().to_string(),
        })
    }

    /// Latest quote, or `None` when the provider has nothing to offer.
    ///
    /// Never fails: timeouts, transport errors and unknown symbols are
    /// logged here and reported as `None`.
    async fn fetch_quote(&self, symbol: &str) -> Option<Quote> {
        let outcome = tokio::time::timeout(self.timeout(), self.get_latest_quote(symbol)).await;
        absorb(self.id(), symbol, "quote", self.timeout(), outcome)
    }

    /// Historical series, or `None` when the provider has nothing to offer.
    ///
    /// An empty series is reported as `None` as well.
    async fn fetch_historical(
        &self,
        symbol: &str,
        period: Period,
        interval: Interval,
    ) -> Option<Vec<HistoricalPoint>> {
        let outcome = tokio::time::timeout(
            self.timeout(),
            self.get_historical_quotes(symbol, period, interval),
        )
        .await;
        absorb(self.id(), symbol, "historical", self.timeout(), outcome)
            .filter(|points| !points.is_empty())
    }
}

fn absorb<T>(
    provider: &str,
    symbol: &str,
    operation: &str,
    timeout: Duration,
    outcome: Result<Result<T, MarketDataError>, tokio::time::error::Elapsed>,
) -> Option<T> {
    match outcome {
        Ok(Ok(value)) => Some(value),
        Ok(Err(e)) if e.is_transient() => {
            warn!(
                "Provider '{}' {} request for {} failed: {}",
                provider, operation, symbol, e
            );
            None
        }
        Ok(Err(e)) => {
            debug!(
                "Provider '{}' has no {} data for {}: {}",
                provider, operation, symbol, e
            );
            None
        }
        Err(_) => {
            warn!(
                "Provider '{}' {} request for {} timed out after {:?}",
                provider, operation, symbol, timeout
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    struct SlowProvider;

    #[async_trait]
    impl MarketDataProvider for SlowProvider {
        fn id(&self) -> &'static str {
            "SLOW"
        }

        fn timeout(&self) -> Duration {
            Duration::from_millis(50)
        }

        async fn get_latest_quote(&self, _symbol: &str) -> Result<Quote, MarketDataError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Err(MarketDataError::NoDataForRange)
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl MarketDataProvider for FailingProvider {
        fn id(&self) -> &'static str {
            "FAILING"
        }

        async fn get_latest_quote(&self, _symbol: &str) -> Result<Quote, MarketDataError> {
            Err(MarketDataError::RateLimited {
                provider: "FAILING".to_string(),
            })
        }

        async fn get_historical_quotes(
            &self,
            _symbol: &str,
            _period: Period,
            _interval: Interval,
        ) -> Result<Vec<HistoricalPoint>, MarketDataError> {
            Ok(Vec::new())
        }
    }

    struct QuoteOnlyProvider;

    #[async_trait]
    impl MarketDataProvider for QuoteOnlyProvider {
        fn id(&self) -> &'static str {
            "QUOTE_ONLY"
        }

        async fn get_latest_quote(&self, symbol: &str) -> Result<Quote, MarketDataError> {
            Ok(Quote {
                symbol: symbol.to_string(),
                price: dec!(10),
                change: dec!(0),
                change_percent: dec!(0),
                volume: dec!(0),
                high: dec!(10),
                low: dec!(10),
                open: dec!(10),
                previous_close: dec!(10),
                timestamp: Utc::now(),
                source: self.id().to_string(),
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_becomes_none() {
        assert!(SlowProvider.fetch_quote("AAPL").await.is_none());
    }

    #[tokio::test]
    async fn test_error_becomes_none() {
        assert!(FailingProvider.fetch_quote("AAPL").await.is_none());
    }

    #[tokio::test]
    async fn test_empty_history_becomes_none() {
        let history = FailingProvider
            .fetch_historical("AAPL", Period::OneMonth, Interval::OneDay)
            .await;
        assert!(history.is_none());
    }

    #[tokio::test]
    async fn test_unsupported_history_becomes_none() {
        let provider = QuoteOnlyProvider;
        assert!(provider.fetch_quote("AAPL").await.is_some());
        assert!(provider
            .fetch_historical("AAPL", Period::OneMonth, Interval::OneDay)
            .await
            .is_none());
    }

    #[test]
    fn test_default_timeout() {
        assert_eq!(QuoteOnlyProvider.timeout(), Duration::from_secs(10));
    }
}
