//! Time-bounded cache for quotes, historical series and reference data.
//!
//! Entries are never evicted proactively. A stale entry reads as a miss and is
//! overwritten by the next `set` for its key.

mod entry;

use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use log::debug;
use serde::Serialize;

use marketpulse_market_data::{HistoricalPoint, Interval, Period, Quote};

pub use entry::{CacheEntry, CachedValue};

pub const QUOTE_TTL: Duration = Duration::from_secs(60);
pub const HISTORICAL_TTL: Duration = Duration::from_secs(3600);
pub const REFERENCE_TTL: Duration = Duration::from_secs(86400);

pub fn quote_key(symbol: &str) -> String {
    format!("quote:{}", symbol)
}

pub fn history_key(symbol: &str, period: Period, interval: Interval) -> String {
    format!("history:{}:{}:{}", symbol, period, interval)
}

pub fn reference_key(key: &str) -> String {
    format!("reference:{}", key)
}

/// Entry counts at a point in time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    /// Every stored entry, stale or not.
    pub entries: usize,
    pub fresh: usize,
}

/// Key-sharded TTL cache.
#[derive(Debug, Default)]
pub struct MarketDataCache {
    entries: DashMap<String, CacheEntry>,
}

impl MarketDataCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<CachedValue> {
        self.get_at(key, Utc::now())
    }

    /// Look up `key` as of `now`. Stale entries are reported as absent.
    pub fn get_at(&self, key: &str, now: DateTime<Utc>) -> Option<CachedValue> {
        let entry = self.entries.get(key)?;
        if entry.is_fresh_at(now) {
            Some(entry.value.clone())
        } else {
            debug!("Cache entry '{}' is stale", key);
            None
        }
    }

    pub fn get_quote(&self, key: &str) -> Option<Quote> {
        match self.get(key)? {
            CachedValue::Quote(quote) => Some(quote),
            _ => None,
        }
    }

    pub fn get_history(&self, key: &str) -> Option<Vec<HistoricalPoint>> {
        match self.get(key)? {
            CachedValue::History(points) => Some(points),
            _ => None,
        }
    }

    pub fn get_json(&self, key: &str) -> Option<serde_json::Value> {
        match self.get(key)? {
            CachedValue::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn set(&self, key: impl Into<String>, value: CachedValue, ttl: Duration) {
        self.set_at(key, value, ttl, Utc::now());
    }

    pub fn set_at(
        &self,
        key: impl Into<String>,
        value: CachedValue,
        ttl: Duration,
        stored_at: DateTime<Utc>,
    ) {
        let key = key.into();
        let entry = CacheEntry {
            key: key.clone(),
            value,
            stored_at,
            ttl,
        };
        self.entries.insert(key, entry);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats_at(Utc::now())
    }

    pub fn stats_at(&self, now: DateTime<Utc>) -> CacheStats {
        let fresh = self
            .entries
            .iter()
            .filter(|entry| entry.is_fresh_at(now))
            .count();
        CacheStats {
            entries: self.entries.len(),
            fresh,
        }
    }
}
