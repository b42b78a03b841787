use anyhow::Context;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use marketpulse_core::service::MARKET_INDICES;
use marketpulse_core::{MarketDataConfig, MarketDataService, MarketEvent};

pub fn init_tracing() {
    let log_format = std::env::var("MARKETPULSE_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

pub fn build_service() -> anyhow::Result<MarketDataService> {
    let config = MarketDataConfig::from_env().context("Invalid market data configuration")?;
    info!(
        "Polling every {}s, quote TTL {}s",
        config.update_interval.as_secs(),
        config.quote_ttl.as_secs()
    );

    let service = MarketDataService::new(config)?;
    for message in service.init_errors() {
        warn!("Provider setup: {}", message);
    }
    info!("Providers in use: {:?}", service.provider_ids());
    Ok(service)
}

/// Subscribe `symbols` (the benchmark indices when empty) and log every
/// event until Ctrl-C.
pub async fn watch(service: &MarketDataService, symbols: &[String]) -> anyhow::Result<()> {
    let mut events = service.events();

    let symbols: Vec<String> = if symbols.is_empty() {
        MARKET_INDICES.iter().map(|s| s.to_string()).collect()
    } else {
        symbols.to_vec()
    };

    for symbol in &symbols {
        if let Err(e) = service.subscribe(symbol) {
            warn!("Cannot watch '{}': {}", symbol, e);
        }
    }
    info!("Watching {:?}", service.subscriptions());

    // Show something right away instead of waiting a full interval.
    service.poll_once().await;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
            event = events.recv() => match event {
                Ok(event) => log_event(&event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Event listener lagged, {} events skipped", skipped);
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    Ok(())
}

fn log_event(event: &MarketEvent) {
    match event {
        MarketEvent::Update { symbol, quote } | MarketEvent::Quote { symbol, quote } => info!(
            "{} {} {} ({}%) via {}",
            symbol,
            quote.price.round_dp(2),
            quote.change.round_dp(2),
            quote.change_percent.round_dp(2),
            quote.source
        ),
        MarketEvent::UpdateFailed { symbol, error } => warn!("{} update failed: {}", symbol, error),
        MarketEvent::Error { message } => error!("{}", message),
    }
}
