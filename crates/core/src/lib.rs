//! MarketPulse Core - the market data service layer.
//!
//! Ties the provider chain from `marketpulse-market-data` and the indicator
//! math from `marketpulse-analytics` together behind [`MarketDataService`]:
//! a TTL cache in front of the providers, a subscription set refreshed by a
//! background poller, and a broadcast stream of [`MarketEvent`]s.

pub mod cache;
pub mod config;
pub mod errors;
pub mod events;
pub mod service;
pub mod subscriptions;

pub use cache::{CacheEntry, CacheStats, CachedValue, MarketDataCache};
pub use config::{MarketDataConfig, ProviderKind};
pub use events::{EventBus, MarketEvent};
pub use service::{MarketAnalysis, MarketDataService, SectorPerformance};
pub use subscriptions::SubscriptionRegistry;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
