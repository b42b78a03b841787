//! Relative Strength Index.

use crate::stats::tail;

pub const DEFAULT_RSI_PERIOD: usize = 14;

/// RSI over the last `period` price changes.
///
/// Average gain and average loss are plain means over the last `period`
/// deltas (no Wilder smoothing). `RSI = 100 - 100 / (1 + gain / loss)`, and
/// exactly 100 when there were no losses.
///
/// Needs `period + 1` values; returns `None` otherwise.
pub fn rsi(series: &[f64], period: usize) -> Option<f64> {
    if period == 0 {
        return None;
    }
    let window = tail(series, period + 1)?;

    let (gains, losses) = window
        .windows(2)
        .map(|w| w[1] - w[0])
        .fold((0.0_f64, 0.0_f64), |(g, l), delta| {
            if delta > 0.0 {
                (g + delta, l)
            } else {
                (g, l - delta)
            }
        });

    let avg_gain = gains / period as f64;
    let avg_loss = losses / period as f64;

    if avg_loss == 0.0 {
        return Some(100.0);
    }

    Some(100.0 - 100.0 / (1.0 + avg_gain / avg_loss))
}
