//! Provider registry: the fallback chain over market data providers.
//!
//! Providers are tried in registration order until one answers. The order is
//! fixed at construction; there is no re-ranking based on past results.

use std::sync::Arc;

use log::{debug, info, warn};

use crate::errors::{MarketDataError, Operation};
use crate::models::{normalize_symbol, HistoricalPoint, Interval, Period, Quote};
use crate::provider::MarketDataProvider;

/// Provider registry for orchestrating market data fetching.
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn MarketDataProvider>>,
}

impl ProviderRegistry {
    /// Create a new provider registry. Priority is the order of `providers`.
    pub fn new(providers: Vec<Arc<dyn MarketDataProvider>>) -> Self {
        Self { providers }
    }

    /// Fetch the latest quote for a symbol.
    ///
    /// Returns the first provider's answer. Fails with
    /// [`MarketDataError::NoDataAvailable`] only when every provider came back
    /// empty; later providers are never called once one has answered.
    pub async fn fetch_latest_quote(&self, symbol: &str) -> Result<Quote, MarketDataError> {
        let symbol = normalize_symbol(symbol)?;

        for provider in &self.providers {
            debug!("Requesting quote for {} from '{}'", symbol, provider.id());

            if let Some(quote) = provider.fetch_quote(&symbol).await {
                info!("Quote for {} served by '{}'", symbol, provider.id());
                return Ok(quote);
            }
        }

        Err(self.exhausted(symbol, Operation::Quote))
    }

    /// Fetch a historical series for a symbol, oldest point first.
    pub async fn fetch_historical(
        &self,
        symbol: &str,
        period: Period,
        interval: Interval,
    ) -> Result<Vec<HistoricalPoint>, MarketDataError> {
        let symbol = normalize_symbol(symbol)?;

        for provider in &self.providers {
            debug!(
                "Requesting {} / {} history for {} from '{}'",
                period,
                interval,
                symbol,
                provider.id()
            );

            if let Some(points) = provider.fetch_historical(&symbol, period, interval).await {
                info!(
                    "Fetched {} historical points for {} from '{}'",
                    points.len(),
                    symbol,
                    provider.id()
                );
                return Ok(points);
            }
        }

        Err(self.exhausted(symbol, Operation::Historical))
    }

    fn exhausted(&self, symbol: String, operation: Operation) -> MarketDataError {
        if self.providers.is_empty() {
            warn!("No providers registered, cannot serve {} for {}", operation, symbol);
        } else {
            warn!(
                "All {} providers returned no {} data for {}",
                self.providers.len(),
                operation,
                symbol
            );
        }
        MarketDataError::NoDataAvailable { symbol, operation }
    }

    /// Ids of the registered providers, in priority order.
    pub fn provider_ids(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.id()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockProvider {
        id: &'static str,
        call_count: AtomicUsize,
        should_fail: bool,
    }

    impl MockProvider {
        fn new(id: &'static str, should_fail: bool) -> Arc<Self> {
            Arc::new(Self {
                id,
                call_count: AtomicUsize::new(0),
                should_fail,
            })
        }

        fn calls(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MarketDataProvider for MockProvider {
        fn id(&self) -> &'static str {
            self.id
        }

        async fn get_latest_quote(&self, symbol: &str) -> Result<Quote, MarketDataError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);

            if self.should_fail {
                return Err(MarketDataError::ProviderError {
                    provider: self.id.to_string(),
                    message: "Mock failure".to_string(),
                });
            }

            Ok(Quote {
                symbol: symbol.to_string(),
                price: dec!(150.0),
                change: dec!(1.5),
                change_percent: dec!(1.01),
                volume: dec!(1000),
                high: dec!(151),
                low: dec!(148),
                open: dec!(149),
                previous_close: dec!(148.5),
                timestamp: Utc.timestamp_opt(1_704_067_200, 0).unwrap(),
                source: self.id.to_string(),
            })
        }

        async fn get_historical_quotes(
            &self,
            _symbol: &str,
            _period: Period,
            _interval: Interval,
        ) -> Result<Vec<HistoricalPoint>, MarketDataError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);

            if self.should_fail {
                return Err(MarketDataError::NoDataForRange);
            }

            Ok(vec![HistoricalPoint {
                date: Utc.timestamp_opt(1_704_067_200, 0).unwrap(),
                open: dec!(100),
                high: dec!(105),
                low: dec!(95),
                close: dec!(102),
                volume: dec!(1000),
            }])
        }
    }

    #[tokio::test]
    async fn test_first_success_wins_and_later_providers_are_skipped() {
        let a = MockProvider::new("A", true);
        let b = MockProvider::new("B", false);
        let c = MockProvider::new("C", false);
        let providers: Vec<Arc<dyn MarketDataProvider>> = vec![a.clone(), b.clone(), c.clone()];
        let registry = ProviderRegistry::new(providers);

        let quote = registry.fetch_latest_quote("aapl").await.unwrap();

        assert_eq!(quote.source, "B");
        assert_eq!(quote.symbol, "AAPL");
        assert_eq!(quote.price, dec!(150.0));
        assert_eq!(a.calls(), 1);
        assert_eq!(b.calls(), 1);
        assert_eq!(c.calls(), 0);
    }

    #[tokio::test]
    async fn test_all_providers_fail() {
        let providers: Vec<Arc<dyn MarketDataProvider>> = vec![
            MockProvider::new("A", true),
            MockProvider::new("B", true),
            MockProvider::new("C", true),
        ];
        let registry = ProviderRegistry::new(providers);

        let result = registry.fetch_latest_quote("ZZZZ").await;

        match result {
            Err(MarketDataError::NoDataAvailable { symbol, operation }) => {
                assert_eq!(symbol, "ZZZZ");
                assert_eq!(operation, Operation::Quote);
            }
            other => panic!("expected NoDataAvailable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_historical_fallback() {
        let a = MockProvider::new("A", true);
        let b = MockProvider::new("B", false);
        let providers: Vec<Arc<dyn MarketDataProvider>> = vec![a.clone(), b.clone()];
        let registry = ProviderRegistry::new(providers);

        let points = registry
            .fetch_historical("MSFT", Period::OneMonth, Interval::OneDay)
            .await
            .unwrap();

        assert_eq!(points.len(), 1);
        assert_eq!(points[0].close, dec!(102));
        assert_eq!(a.calls(), 1);
    }

    #[tokio::test]
    async fn test_historical_all_fail() {
        let providers: Vec<Arc<dyn MarketDataProvider>> = vec![MockProvider::new("A", true)];
        let registry = ProviderRegistry::new(providers);
        let result = registry
            .fetch_historical("MSFT", Period::OneMonth, Interval::OneDay)
            .await;
        assert!(matches!(
            result,
            Err(MarketDataError::NoDataAvailable {
                operation: Operation::Historical,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_empty_registry() {
        let registry = ProviderRegistry::new(Vec::new());
        let result = registry.fetch_latest_quote("AAPL").await;
        assert!(matches!(result, Err(MarketDataError::NoDataAvailable { .. })));
    }

    #[tokio::test]
    async fn test_invalid_symbol_never_reaches_providers() {
        let a = MockProvider::new("A", false);
        let providers: Vec<Arc<dyn MarketDataProvider>> = vec![a.clone()];
        let registry = ProviderRegistry::new(providers);

        let result = registry.fetch_latest_quote("  ").await;

        assert!(matches!(result, Err(MarketDataError::InvalidSymbol(_))));
        assert_eq!(a.calls(), 0);
    }

    #[test]
    fn test_provider_order_is_registration_order() {
        let providers: Vec<Arc<dyn MarketDataProvider>> = vec![
            MockProvider::new("YAHOO", false),
            MockProvider::new("FINNHUB", false),
            MockProvider::new("ALPHA_VANTAGE", false),
        ];
        let registry = ProviderRegistry::new(providers);
        assert_eq!(
            registry.provider_ids(),
            vec!["YAHOO", "FINNHUB", "ALPHA_VANTAGE"]
        );
    }
}
