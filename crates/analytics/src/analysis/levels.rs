//! Support and resistance from recent lows and highs.

use marketpulse_market_data::HistoricalPoint;
use num_traits::ToPrimitive;

use super::MIN_ANALYSIS_POINTS;

/// Number of most recent points considered.
pub const LEVELS_LOOKBACK: usize = 50;

/// The 10th-percentile low of the last 50 points.
pub fn support(points: &[HistoricalPoint]) -> Option<f64> {
    let mut lows = recent_values(points, |p| p.low.to_f64())?;
    lows.sort_by(|a, b| a.total_cmp(b));
    pick_decile(&lows)
}

/// The 10th-percentile-from-top high of the last 50 points.
pub fn resistance(points: &[HistoricalPoint]) -> Option<f64> {
    let mut highs = recent_values(points, |p| p.high.to_f64())?;
    highs.sort_by(|a, b| b.total_cmp(a));
    pick_decile(&highs)
}

fn recent_values(
    points: &[HistoricalPoint],
    value: impl Fn(&HistoricalPoint) -> Option<f64>,
) -> Option<Vec<f64>> {
    if points.len() < MIN_ANALYSIS_POINTS {
        return None;
    }
    let start = points.len().saturating_sub(LEVELS_LOOKBACK);
    Some(points[start..].iter().filter_map(value).collect())
}

fn pick_decile(sorted: &[f64]) -> Option<f64> {
    sorted.get(sorted.len() / 10).copied()
}
