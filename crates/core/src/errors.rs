//! Core error types for the MarketPulse service layer.
//!
//! Provider-level failures stay inside [`MarketDataError`]; this type adds the
//! service's own failure modes on top.

use marketpulse_market_data::MarketDataError;
use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the service layer.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid configuration value: {0}")]
    InvalidConfigValue(String),

    #[error("Market data operation failed: {0}")]
    MarketData(#[from] MarketDataError),

    #[error("Reference data loader failed: {0}")]
    ReferenceData(String),

    #[error("No Tokio runtime available: {0}")]
    Runtime(String),
}

impl Error {
    /// True when every provider came back empty for the request.
    pub fn is_no_data(&self) -> bool {
        matches!(
            self,
            Error::MarketData(MarketDataError::NoDataAvailable { .. })
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marketpulse_market_data::Operation;

    #[test]
    fn test_no_data_classification() {
        let err: Error = MarketDataError::NoDataAvailable {
            symbol: "ZZZZ".to_string(),
            operation: Operation::Quote,
        }
        .into();
        assert!(err.is_no_data());
        assert_eq!(
            err.to_string(),
            "Market data operation failed: No data available for ZZZZ (quote)"
        );

        let err: Error = MarketDataError::InvalidSymbol(String::new()).into();
        assert!(!err.is_no_data());
    }
}
