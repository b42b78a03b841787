//! Error types for the market data crate.
//!
//! Provider adapters produce [`MarketDataError`] internally. The adapter
//! contract in [`MarketDataProvider`](crate::provider::MarketDataProvider)
//! absorbs every variant except [`MarketDataError::NoDataAvailable`], which
//! only the fallback registry raises once the whole chain came back empty.

use std::fmt;

use thiserror::Error;

/// The logical request a fallback chain was resolving.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Operation {
    Quote,
    Historical,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Quote => "quote",
            Self::Historical => "historical",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur during market data operations.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The symbol was empty after normalization.
    #[error("Invalid symbol: '{0}'")]
    InvalidSymbol(String),

    /// The requested symbol was not found by the provider.
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// The symbol exists but the provider has no quotes in the requested range.
    #[error("No data for date range")]
    NoDataForRange,

    /// The provider rate limited the request (HTTP 429 or quota exhausted).
    #[error("Rate limited: {provider}")]
    RateLimited {
        /// The provider that rate limited the request
        provider: String,
    },

    /// The request to the provider exceeded its timeout.
    #[error("Timeout: {provider}")]
    Timeout {
        /// The provider that timed out
        provider: String,
    },

    /// A provider-specific error occurred.
    #[error("Provider error: {provider} - {message}")]
    ProviderError {
        /// The provider that returned the error
        provider: String,
        /// The error message from the provider
        message: String,
    },

    /// The provider does not implement the operation.
    #[error("Operation '{operation}' not supported by {provider}")]
    NotSupported {
        operation: String,
        provider: String,
    },

    /// Every provider in the fallback chain returned no data.
    #[error("No data available for {symbol} ({operation})")]
    NoDataAvailable {
        /// The normalized symbol that was requested
        symbol: String,
        /// The request that could not be satisfied
        operation: Operation,
    },

    /// A network error occurred while communicating with a provider.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl MarketDataError {
    /// Whether the failure is transport-level (timeout, network, rate limit).
    ///
    /// Transient failures are logged at `warn`, everything else an adapter
    /// reports is an ordinary "no data" answer and logged at `debug`.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::RateLimited { .. } | Self::Network(_)
        )
    }

    pub(crate) fn provider_error(provider: &str, message: impl Into<String>) -> Self {
        Self::ProviderError {
            provider: provider.to_string(),
            message: message.into(),
        }
    }
}
