//! Analysis engine: trend, volatility and price levels over a historical series.

mod levels;
mod trend;
mod volatility;

use marketpulse_market_data::HistoricalPoint;
use num_traits::ToPrimitive;

pub use levels::{resistance, support, LEVELS_LOOKBACK};
pub use trend::{trend, Trend, TREND_WINDOW};
pub use volatility::{volatility, TRADING_DAYS_PER_YEAR};

/// Minimum number of points for any analysis result.
pub const MIN_ANALYSIS_POINTS: usize = 20;

/// Close prices of a series as `f64`, oldest first.
///
/// Closes that do not fit an `f64` are skipped.
pub fn closes(points: &[HistoricalPoint]) -> Vec<f64> {
    points.iter().filter_map(|p| p.close.to_f64()).collect()
}
