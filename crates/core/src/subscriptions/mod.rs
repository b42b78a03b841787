//! Subscription registry and the poller that refreshes it.

mod poller;

use std::collections::BTreeSet;
use std::sync::RwLock;

use marketpulse_market_data::{normalize_symbol, MarketDataError};

pub(crate) use poller::spawn_poller;

/// The set of symbols the poller refreshes every cycle.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    symbols: RwLock<BTreeSet<String>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a symbol. Returns the normalized symbol and whether it was new.
    pub fn subscribe(&self, symbol: &str) -> Result<(String, bool), MarketDataError> {
        let symbol = normalize_symbol(symbol)?;
        let added = self
            .symbols
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(symbol.clone());
        Ok((symbol, added))
    }

    /// Remove a symbol. Unknown or empty symbols are a no-op.
    pub fn unsubscribe(&self, symbol: &str) -> bool {
        let Ok(symbol) = normalize_symbol(symbol) else {
            return false;
        };
        self.symbols
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&symbol)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        normalize_symbol(symbol)
            .map(|s| {
                self.symbols
                    .read()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .contains(&s)
            })
            .unwrap_or(false)
    }

    /// Sorted copy of the current set.
    pub fn snapshot(&self) -> Vec<String> {
        self.symbols
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.symbols
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.symbols
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribe_is_idempotent_and_normalized() {
        let registry = SubscriptionRegistry::new();
        assert_eq!(
            registry.subscribe(" aapl ").unwrap(),
            ("AAPL".to_string(), true)
        );
        assert_eq!(
            registry.subscribe("AAPL").unwrap(),
            ("AAPL".to_string(), false)
        );
        assert_eq!(registry.len(), 1);
        assert!(registry.contains("aapl"));
    }

    #[test]
    fn test_subscribe_rejects_empty_symbol() {
        let registry = SubscriptionRegistry::new();
        assert!(matches!(
            registry.subscribe("   "),
            Err(MarketDataError::InvalidSymbol(_))
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unsubscribe_absent_symbol_is_noop() {
        let registry = SubscriptionRegistry::new();
        assert!(!registry.unsubscribe("MSFT"));
        assert!(!registry.unsubscribe(""));

        registry.subscribe("msft").unwrap();
        assert!(registry.unsubscribe("Msft"));
        assert!(!registry.contains("MSFT"));
    }

    #[test]
    fn test_snapshot_is_sorted() {
        let registry = SubscriptionRegistry::new();
        for symbol in ["TSLA", "aapl", "MSFT"] {
            registry.subscribe(symbol).unwrap();
        }
        assert_eq!(registry.snapshot(), vec!["AAPL", "MSFT", "TSLA"]);

        registry.clear();
        assert!(registry.snapshot().is_empty());
    }
}
