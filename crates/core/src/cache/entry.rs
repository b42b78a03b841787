use std::time::Duration;

use chrono::{DateTime, Utc};

use marketpulse_market_data::{HistoricalPoint, Quote};

/// A value held by the cache.
#[derive(Clone, Debug, PartialEq)]
pub enum CachedValue {
    Quote(Quote),
    History(Vec<HistoricalPoint>),
    Json(serde_json::Value),
}

/// One stored value with the time it was stored and how long it stays fresh.
#[derive(Clone, Debug, PartialEq)]
pub struct CacheEntry {
    pub key: String,
    pub value: CachedValue,
    pub stored_at: DateTime<Utc>,
    pub ttl: Duration,
}

impl CacheEntry {
    /// Fresh iff `now - stored_at < ttl`.
    ///
    /// An entry stamped in the future (clock moved backwards) counts as fresh.
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        match now.signed_duration_since(self.stored_at).to_std() {
            Ok(age) => age < self.ttl,
            Err(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(ttl_secs: u64) -> CacheEntry {
        CacheEntry {
            key: "reference:k".to_string(),
            value: CachedValue::Json(serde_json::Value::Null),
            stored_at: Utc.timestamp_opt(1_000, 0).unwrap(),
            ttl: Duration::from_secs(ttl_secs),
        }
    }

    #[test]
    fn test_freshness_boundary() {
        let e = entry(60);
        assert!(e.is_fresh_at(Utc.timestamp_opt(1_000, 0).unwrap()));
        assert!(e.is_fresh_at(Utc.timestamp_opt(1_059, 0).unwrap()));
        assert!(!e.is_fresh_at(Utc.timestamp_opt(1_060, 0).unwrap()));
    }

    #[test]
    fn test_zero_ttl_is_never_fresh() {
        let e = entry(0);
        assert!(!e.is_fresh_at(Utc.timestamp_opt(1_000, 0).unwrap()));
    }

    #[test]
    fn test_future_entry_is_fresh() {
        let e = entry(60);
        assert!(e.is_fresh_at(Utc.timestamp_opt(900, 0).unwrap()));
    }
}
