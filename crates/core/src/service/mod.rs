//! Market data service.
//!
//! [`MarketDataService`] owns the provider chain, the cache, the subscription
//! set and the event bus for one instance. Every read goes cache first and
//! falls through to the provider registry on a miss.

mod market;
mod provider_setup;


use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use futures::future::join_all;
use log::{debug, info, warn};
use tokio::sync::broadcast;
use tokio::task::{JoinHandle, JoinSet};

use marketpulse_analytics::analysis::{closes, resistance, support, trend, volatility};
use marketpulse_analytics::TechnicalIndicators;
use marketpulse_market_data::{
    normalize_symbol, HistoricalPoint, Interval, MarketDataProvider, Period, ProviderRegistry,
    Quote,
};

use crate::cache::{self, CacheStats, CachedValue, MarketDataCache};
use crate::config::MarketDataConfig;
use crate::errors::{Error, Result};
use crate::events::{EventBus, MarketEvent};
use crate::subscriptions::{spawn_poller, SubscriptionRegistry};

pub use market::{MarketAnalysis, SectorPerformance, MARKET_INDICES, SECTOR_ETFS};

/// History window used for indicators and analysis.
pub const ANALYSIS_PERIOD: Period = Period::SixMonths;
pub const ANALYSIS_INTERVAL: Interval = Interval::OneDay;

/// Market data service.
///
/// Dropping the service stops its poller. Call [`destroy`](Self::destroy) to
/// also release cached data, subscriptions and event listeners while keeping
/// the instance around.
pub struct MarketDataService {
    inner: Arc<ServiceInner>,
}

struct ServiceInner {
    config: MarketDataConfig,
    registry: ProviderRegistry,
    cache: MarketDataCache,
    subscriptions: SubscriptionRegistry,
    events: EventBus,
    poller: Mutex<Option<JoinHandle<()>>>,
    init_errors: Vec<String>,
    init_errors_published: AtomicBool,
}

impl MarketDataService {
    /// Create a service with the providers named in `config`.
    ///
    /// Providers that cannot be set up are skipped and reported through
    /// [`init_errors`](Self::init_errors) and as [`MarketEvent::Error`] once
    /// the poller starts.
    pub fn new(config: MarketDataConfig) -> Result<Self> {
        config.validate()?;
        let (providers, init_errors) = provider_setup::build_providers(&config);
        Ok(Self::build(config, providers, init_errors))
    }

    /// Create a service over an explicit provider chain.
    pub fn with_providers(
        config: MarketDataConfig,
        providers: Vec<Arc<dyn MarketDataProvider>>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config, providers, Vec::new()))
    }

    fn build(
        config: MarketDataConfig,
        providers: Vec<Arc<dyn MarketDataProvider>>,
        mut init_errors: Vec<String>,
    ) -> Self {
        if providers.is_empty() {
            warn!("Market data service has no providers; every fetch will fail");
            init_errors.push("no market data providers available".to_string());
        }

        let events = EventBus::new(config.event_capacity);
        Self {
            inner: Arc::new(ServiceInner {
                registry: ProviderRegistry::new(providers),
                cache: MarketDataCache::new(),
                subscriptions: SubscriptionRegistry::new(),
                events,
                poller: Mutex::new(None),
                init_errors,
                init_errors_published: AtomicBool::new(false),
                config,
            }),
        }
    }

    pub fn config(&self) -> &MarketDataConfig {
        &self.inner.config
    }

    pub fn provider_ids(&self) -> Vec<&'static str> {
        self.inner.registry.provider_ids()
    }

    pub fn init_errors(&self) -> &[String] {
        &self.inner.init_errors
    }

    /// Listen for quote, update and error events.
    pub fn events(&self) -> broadcast::Receiver<MarketEvent> {
        self.inner.events.subscribe()
    }

    // =========================================================================
    // Quotes and history
    // =========================================================================

    /// Latest quote for a symbol, served from cache while fresh.
    pub async fn get_quote(&self, symbol: &str) -> Result<Quote> {
        let symbol = normalize_symbol(symbol)?;

        if let Some(quote) = self.inner.cached_quote(&symbol) {
            return Ok(quote);
        }

        let quote = self.inner.fetch_quote(&symbol).await?;
        self.inner.events.publish(MarketEvent::Quote {
            symbol,
            quote: quote.clone(),
        });
        Ok(quote)
    }

    /// Quotes for several symbols. Symbols without data are logged and left out.
    pub async fn get_quotes<S: AsRef<str>>(&self, symbols: &[S]) -> BTreeMap<String, Quote> {
        let symbols = unique_symbols(symbols);
        let results = join_all(symbols.iter().map(|s| self.get_quote(s))).await;

        symbols
            .iter()
            .zip(results)
            .filter_map(|(symbol, result)| match result {
                Ok(quote) => Some((quote.symbol.clone(), quote)),
                Err(e) => {
                    warn!("Skipping {}: {}", symbol, e);
                    None
                }
            })
            .collect()
    }

    /// Historical bars for a symbol, oldest first, served from cache while fresh.
    pub async fn get_historical_data(
        &self,
        symbol: &str,
        period: Period,
        interval: Interval,
    ) -> Result<Vec<HistoricalPoint>> {
        let symbol = normalize_symbol(symbol)?;
        let key = cache::history_key(&symbol, period, interval);

        if let Some(points) = self.inner.cache.get_history(&key) {
            debug!("History cache hit for {}", key);
            return Ok(points);
        }

        let points = self
            .inner
            .registry
            .fetch_historical(&symbol, period, interval)
            .await?;
        self.inner.cache.set(
            key,
            CachedValue::History(points.clone()),
            self.inner.config.historical_ttl,
        );
        Ok(points)
    }

    /// Slow-changing reference data, loaded through `loader` on a miss.
    ///
    /// A failed load is returned as is and nothing is cached.
    pub async fn get_reference_data<F, Fut>(&self, key: &str, loader: F) -> Result<serde_json::Value>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<serde_json::Value>>,
    {
        let key = cache::reference_key(key);

        if let Some(value) = self.inner.cache.get_json(&key) {
            return Ok(value);
        }

        let value = loader().await?;
        self.inner.cache.set(
            key,
            CachedValue::Json(value.clone()),
            self.inner.config.reference_ttl,
        );
        Ok(value)
    }

    // =========================================================================
    // Market overview
    // =========================================================================

    /// Quotes for the benchmark index ETFs.
    pub async fn get_market_indices(&self) -> BTreeMap<String, Quote> {
        self.get_quotes(&MARKET_INDICES[..]).await
    }

    /// Performance of each sector, keyed by sector name.
    pub async fn get_sector_performance(&self) -> BTreeMap<String, SectorPerformance> {
        let etfs: Vec<&str> = SECTOR_ETFS.iter().map(|(_, etf)| *etf).collect();
        let quotes = self.get_quotes(etfs.as_slice()).await;

        SECTOR_ETFS
            .iter()
            .filter_map(|(sector, etf)| {
                quotes
                    .get(*etf)
                    .map(|quote| (sector.to_string(), SectorPerformance::from(quote)))
            })
            .collect()
    }

    /// Indicator snapshot over six months of daily closes.
    pub async fn get_technical_indicators(&self, symbol: &str) -> Result<TechnicalIndicators> {
        let history = self
            .get_historical_data(symbol, ANALYSIS_PERIOD, ANALYSIS_INTERVAL)
            .await?;
        Ok(TechnicalIndicators::from_closes(&closes(&history)))
    }

    /// Full analysis for each symbol. Symbols without data are logged and left out.
    pub async fn get_market_analysis<S: AsRef<str>>(
        &self,
        symbols: &[S],
    ) -> BTreeMap<String, MarketAnalysis> {
        let symbols = unique_symbols(symbols);
        let results = join_all(symbols.iter().map(|s| self.analyze(s))).await;

        symbols
            .iter()
            .zip(results)
            .filter_map(|(symbol, result)| match result {
                Ok(analysis) => Some((analysis.quote.symbol.clone(), analysis)),
                Err(e) => {
                    warn!("No analysis for {}: {}", symbol, e);
                    None
                }
            })
            .collect()
    }

    async fn analyze(&self, symbol: &str) -> Result<MarketAnalysis> {
        let (quote, history) = tokio::try_join!(
            self.get_quote(symbol),
            self.get_historical_data(symbol, ANALYSIS_PERIOD, ANALYSIS_INTERVAL)
        )?;

        let closes = closes(&history);
        Ok(MarketAnalysis {
            quote,
            indicators: TechnicalIndicators::from_closes(&closes),
            trend: trend(&closes),
            volatility: volatility(&closes),
            support: support(&history),
            resistance: resistance(&history),
        })
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    /// Watch a symbol. The poller is started on the first subscription.
    ///
    /// Must be called from within a Tokio runtime. Outside one the symbol is
    /// not added.
    pub fn subscribe(&self, symbol: &str) -> Result<()> {
        tokio::runtime::Handle::try_current().map_err(|e| Error::Runtime(e.to_string()))?;

        let (symbol, added) = self.inner.subscriptions.subscribe(symbol)?;
        if added {
            info!("Subscribed to {}", symbol);
        }
        self.ensure_poller();
        Ok(())
    }

    /// Stop watching a symbol. Unknown symbols are ignored.
    pub fn unsubscribe(&self, symbol: &str) {
        if self.inner.subscriptions.unsubscribe(symbol) {
            info!("Unsubscribed from {}", symbol.trim().to_uppercase());
        }
    }

    pub fn subscriptions(&self) -> Vec<String> {
        self.inner.subscriptions.snapshot()
    }

    pub fn is_subscribed(&self, symbol: &str) -> bool {
        self.inner.subscriptions.contains(symbol)
    }

    /// Run one poll cycle now and wait for all of its fetches.
    pub async fn poll_once(&self) {
        let mut set = JoinSet::new();
        self.inner.spawn_poll_cycle(&mut set);
        while set.join_next().await.is_some() {}
    }

    fn ensure_poller(&self) {
        let mut poller = self
            .inner
            .poller
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if poller.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }

        let weak: Weak<ServiceInner> = Arc::downgrade(&self.inner);
        *poller = Some(spawn_poller(
            self.inner.config.update_interval,
            move |set| match weak.upgrade() {
                Some(inner) => {
                    inner.spawn_poll_cycle(set);
                    true
                }
                None => false,
            },
        ));

        // only the first start reports setup problems
        if !self.inner.init_errors_published.swap(true, Ordering::SeqCst) {
            for message in &self.inner.init_errors {
                self.inner.events.publish(MarketEvent::Error {
                    message: message.clone(),
                });
            }
        }
    }

    // =========================================================================
    // Cache and lifecycle
    // =========================================================================

    pub fn clear_cache(&self) {
        self.inner.cache.clear();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.inner.cache.stats()
    }

    /// Stop the poller, drop all cached data and subscriptions, and close
    /// every event receiver handed out so far.
    pub fn destroy(&self) {
        self.inner.stop_poller();
        self.inner.cache.clear();
        self.inner.subscriptions.clear();
        self.inner.events.reset();
        info!("Market data service destroyed");
    }
}

/// Normalized symbols with duplicates removed. Invalid symbols are logged and dropped.
fn unique_symbols<S: AsRef<str>>(symbols: &[S]) -> BTreeSet<String> {
    symbols
        .iter()
        .filter_map(|symbol| match normalize_symbol(symbol.as_ref()) {
            Ok(symbol) => Some(symbol),
            Err(e) => {
                warn!("Skipping {:?}: {}", symbol.as_ref(), e);
                None
            }
        })
        .collect()
}

impl Drop for MarketDataService {
    fn drop(&mut self) {
        self.inner.stop_poller();
    }
}

impl ServiceInner {
    fn cached_quote(&self, symbol: &str) -> Option<Quote> {
        let quote = self.cache.get_quote(&cache::quote_key(symbol));
        if quote.is_some() {
            debug!("Quote cache hit for {}", symbol);
        }
        quote
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<Quote> {
        let quote = self.registry.fetch_latest_quote(symbol).await?;
        self.cache.set(
            cache::quote_key(symbol),
            CachedValue::Quote(quote.clone()),
            self.config.quote_ttl,
        );
        Ok(quote)
    }

    async fn quote(&self, symbol: &str) -> Result<Quote> {
        match self.cached_quote(symbol) {
            Some(quote) => Ok(quote),
            None => self.fetch_quote(symbol).await,
        }
    }

    /// Spawn one refresh per currently subscribed symbol.
    fn spawn_poll_cycle(self: &Arc<Self>, set: &mut JoinSet<()>) {
        let symbols = self.subscriptions.snapshot();
        if symbols.is_empty() {
            debug!("Poll cycle skipped: no subscriptions");
            return;
        }

        debug!("Poll cycle for {} symbols", symbols.len());
        for symbol in symbols {
            let inner = Arc::clone(self);
            set.spawn(async move { inner.refresh(symbol).await });
        }
    }

    async fn refresh(&self, symbol: String) {
        let result = self.quote(&symbol).await;

        if !self.subscriptions.contains(&symbol) {
            debug!("Discarding refresh for {}: unsubscribed while in flight", symbol);
            return;
        }

        match result {
            Ok(quote) => self.events.publish(MarketEvent::Update { symbol, quote }),
            Err(e) => {
                warn!("Failed to refresh {}: {}", symbol, e);
                self.events.publish(MarketEvent::UpdateFailed {
                    symbol,
                    error: e.to_string(),
                });
            }
        }
    }

    fn stop_poller(&self) {
        let handle = self
            .poller
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(handle) = handle {
            handle.abort();
            debug!("Quote poller stopped");
        }
    }
}
