use std::sync::Arc;

use log::{info, warn};

use marketpulse_market_data::{
    AlphaVantageProvider, FinnhubProvider, MarketDataProvider, YahooProvider,
};

use crate::config::{MarketDataConfig, ProviderKind};

/// Build the configured providers in fallback order.
///
/// Providers that cannot be constructed (missing API key, connector failure)
/// are left out of the chain; the returned messages describe each one.
pub(crate) fn build_providers(
    config: &MarketDataConfig,
) -> (Vec<Arc<dyn MarketDataProvider>>, Vec<String>) {
    let mut providers: Vec<Arc<dyn MarketDataProvider>> = Vec::new();
    let mut errors = Vec::new();
    let timeout = config.provider_timeout;

    for kind in &config.providers {
        match kind {
            ProviderKind::Yahoo => match YahooProvider::with_timeout(timeout) {
                Ok(provider) => providers.push(Arc::new(provider)),
                Err(e) => errors.push(format!("yahoo: {}", e)),
            },
            ProviderKind::Finnhub => match &config.finnhub_api_key {
                Some(key) => {
                    providers.push(Arc::new(FinnhubProvider::with_timeout(key.clone(), timeout)))
                }
                None => errors.push("finnhub: FINNHUB_API_KEY is not set".to_string()),
            },
            ProviderKind::AlphaVantage => match &config.alpha_vantage_api_key {
                Some(key) => providers.push(Arc::new(AlphaVantageProvider::with_timeout(
                    key.clone(),
                    timeout,
                ))),
                None => {
                    errors.push("alpha_vantage: ALPHA_VANTAGE_API_KEY is not set".to_string())
                }
            },
        }
    }

    for error in &errors {
        warn!("Skipping provider: {}", error);
    }
    info!(
        "Provider chain: [{}]",
        providers
            .iter()
            .map(|p| p.id())
            .collect::<Vec<_>>()
            .join(", ")
    );

    (providers, errors)
}
