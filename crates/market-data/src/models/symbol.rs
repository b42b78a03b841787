use crate::errors::MarketDataError;

/// Trim and uppercase a ticker symbol.
///
/// Cache keys, subscriptions and quotes all carry the normalized form, so
/// `aapl`, ` AAPL ` and `AAPL` address the same instrument.
pub fn normalize_symbol(symbol: &str) -> Result<String, MarketDataError> {
    let normalized = symbol.trim().to_uppercase();
    if normalized.is_empty() {
        return Err(MarketDataError::InvalidSymbol(symbol.to_string()));
    }
    Ok(normalized)
}
