use super::MIN_ANALYSIS_POINTS;
use crate::stats::population_std_dev;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Annualized volatility in percent: population std-dev of simple returns
/// across the whole series, scaled by √252.
///
/// `0.0` for fewer than 20 closes. Returns off a zero close are skipped.
pub fn volatility(closes: &[f64]) -> f64 {
    if closes.len() < MIN_ANALYSIS_POINTS {
        return 0.0;
    }

    let returns: Vec<f64> = closes
        .windows(2)
        .filter(|w| w[0] != 0.0)
        .map(|w| (w[1] - w[0]) / w[0])
        .collect();

    population_std_dev(&returns)
        .map(|sd| sd * TRADING_DAYS_PER_YEAR.sqrt() * 100.0)
        .unwrap_or(0.0)
}
