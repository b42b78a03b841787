//! Service configuration.
//!
//! Defaults match the documented TTLs and poll interval. `from_env` overlays
//! `MARKETPULSE_*` variables plus the provider API keys.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::{HISTORICAL_TTL, QUOTE_TTL, REFERENCE_TTL};
use crate::errors::{Error, Result};
use marketpulse_market_data::DEFAULT_PROVIDER_TIMEOUT;

pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// The provider adapters that can be placed in the fallback chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Yahoo,
    Finnhub,
    AlphaVantage,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Yahoo => "yahoo",
            ProviderKind::Finnhub => "finnhub",
            ProviderKind::AlphaVantage => "alpha_vantage",
        }
    }
}

impl FromStr for ProviderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "yahoo" => Ok(ProviderKind::Yahoo),
            "finnhub" => Ok(ProviderKind::Finnhub),
            "alpha_vantage" | "alphavantage" => Ok(ProviderKind::AlphaVantage),
            other => Err(Error::InvalidConfigValue(format!(
                "unknown provider '{}'",
                other
            ))),
        }
    }
}

/// Configuration for [`MarketDataService`](crate::service::MarketDataService).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MarketDataConfig {
    #[serde(with = "duration_secs")]
    pub update_interval: Duration,
    #[serde(with = "duration_secs")]
    pub quote_ttl: Duration,
    #[serde(with = "duration_secs")]
    pub historical_ttl: Duration,
    #[serde(with = "duration_secs")]
    pub reference_ttl: Duration,
    #[serde(with = "duration_secs")]
    pub provider_timeout: Duration,
    /// Fallback order; the first entry is asked first.
    pub providers: Vec<ProviderKind>,
    #[serde(skip_serializing)]
    pub finnhub_api_key: Option<String>,
    #[serde(skip_serializing)]
    pub alpha_vantage_api_key: Option<String>,
    pub event_capacity: usize,
}

impl Default for MarketDataConfig {
    fn default() -> Self {
        Self {
            update_interval: DEFAULT_UPDATE_INTERVAL,
            quote_ttl: QUOTE_TTL,
            historical_ttl: HISTORICAL_TTL,
            reference_ttl: REFERENCE_TTL,
            provider_timeout: DEFAULT_PROVIDER_TIMEOUT,
            providers: vec![
                ProviderKind::Yahoo,
                ProviderKind::Finnhub,
                ProviderKind::AlphaVantage,
            ],
            finnhub_api_key: None,
            alpha_vantage_api_key: None,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl MarketDataConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup, falling back to the
    /// defaults for anything missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = var("MARKETPULSE_UPDATE_INTERVAL_SECS") {
            config.update_interval = parse_secs("MARKETPULSE_UPDATE_INTERVAL_SECS", &v)?;
        }
        if let Some(v) = var("MARKETPULSE_QUOTE_TTL_SECS") {
            config.quote_ttl = parse_secs("MARKETPULSE_QUOTE_TTL_SECS", &v)?;
        }
        if let Some(v) = var("MARKETPULSE_HISTORICAL_TTL_SECS") {
            config.historical_ttl = parse_secs("MARKETPULSE_HISTORICAL_TTL_SECS", &v)?;
        }
        if let Some(v) = var("MARKETPULSE_REFERENCE_TTL_SECS") {
            config.reference_ttl = parse_secs("MARKETPULSE_REFERENCE_TTL_SECS", &v)?;
        }
        if let Some(v) = var("MARKETPULSE_PROVIDER_TIMEOUT_SECS") {
            config.provider_timeout = parse_secs("MARKETPULSE_PROVIDER_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = var("MARKETPULSE_PROVIDERS") {
            config.providers = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ProviderKind::from_str)
                .collect::<Result<Vec<_>>>()?;
        }
        if let Some(v) = var("MARKETPULSE_EVENT_CAPACITY") {
            config.event_capacity = v.trim().parse().map_err(|_| {
                Error::InvalidConfigValue(format!("MARKETPULSE_EVENT_CAPACITY: '{}'", v))
            })?;
        }

        config.finnhub_api_key = var("FINNHUB_API_KEY");
        config.alpha_vantage_api_key = var("ALPHA_VANTAGE_API_KEY");

        config.validate()?;
        Ok(config)
    }

    /// Reject values the runtime cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.update_interval.is_zero() {
            return Err(Error::InvalidConfigValue(
                "update interval must be greater than zero".to_string(),
            ));
        }
        if self.provider_timeout.is_zero() {
            return Err(Error::InvalidConfigValue(
                "provider timeout must be greater than zero".to_string(),
            ));
        }
        if self.event_capacity == 0 {
            return Err(Error::InvalidConfigValue(
                "event capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_secs(key: &str, value: &str) -> Result<Duration> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| Error::InvalidConfigValue(format!("{}: '{}' is not a number of seconds", key, value)))
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
