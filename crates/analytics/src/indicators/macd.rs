//! Moving Average Convergence Divergence.
//!
//! The signal line is the 9-period EMA of the MACD line's history (one MACD
//! value per index from the 26th close on), not of the latest MACD value
//! alone. An EMA of a single value is that value, which would pin the
//! histogram at zero.

use serde::{Deserialize, Serialize};

use super::moving_average::{ema, ema_series};

pub const MACD_FAST_PERIOD: usize = 12;
pub const MACD_SLOW_PERIOD: usize = 26;
pub const MACD_SIGNAL_PERIOD: usize = 9;

/// MACD line with its signal line and histogram.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Macd {
    /// `EMA(12) - EMA(26)` at the last close
    pub macd: f64,
    /// 9-period EMA of the MACD line; `None` until the line has 9 values
    pub signal: Option<f64>,
    /// `macd - signal`
    pub histogram: Option<f64>,
}

/// Compute MACD for a close series.
///
/// Needs 26 closes for the MACD line and 34 for the signal line.
pub fn macd(series: &[f64]) -> Option<Macd> {
    if series.len() < MACD_SLOW_PERIOD {
        return None;
    }

    let line = macd_line(series);
    let macd = *line.last()?;
    let signal = ema(&line, MACD_SIGNAL_PERIOD);

    Some(Macd {
        macd,
        signal,
        histogram: signal.map(|s| macd - s),
    })
}

/// MACD value at every index where the slow EMA has a full window behind it.
fn macd_line(series: &[f64]) -> Vec<f64> {
    let fast = ema_series(series, MACD_FAST_PERIOD);
    let slow = ema_series(series, MACD_SLOW_PERIOD);

    fast.iter()
        .zip(&slow)
        .skip(MACD_SLOW_PERIOD - 1)
        .map(|(f, s)| f - s)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_macd_insufficient_data() {
        let series: Vec<f64> = (0..25).map(|x| x as f64).collect();
        assert!(macd(&series).is_none());
    }

    #[test]
    fn test_macd_without_signal_history() {
        let series: Vec<f64> = (0..30).map(|x| 100.0 + x as f64).collect();
        let result = macd(&series).unwrap();
        assert!(result.macd > 0.0);
        assert!(result.signal.is_none());
        assert!(result.histogram.is_none());
    }

    #[test]
    fn test_macd_constant_series_is_flat() {
        let series = vec![42.0; 60];
        let result = macd(&series).unwrap();
        assert!(result.macd.abs() < 1e-9);
        assert!(result.signal.unwrap().abs() < 1e-9);
        assert!(result.histogram.unwrap().abs() < 1e-9);
    }

    #[test]
    fn test_macd_line_matches_ema_difference() {
        let series: Vec<f64> = (0..50).map(|x| 100.0 + (x as f64 * 0.3).sin() * 5.0).collect();
        let result = macd(&series).unwrap();
        let expected =
            ema(&series, MACD_FAST_PERIOD).unwrap() - ema(&series, MACD_SLOW_PERIOD).unwrap();
        assert!((result.macd - expected).abs() < 1e-9);
    }

    #[test]
    fn test_signal_tracks_history() {
        // rally then sell-off: the MACD line turns down faster than its signal
        let mut series: Vec<f64> = (0..40).map(|x| 100.0 + x as f64).collect();
        series.extend((0..10).map(|x| 139.0 - 3.0 * x as f64));

        let result = macd(&series).unwrap();
        let signal = result.signal.unwrap();
        assert!(result.macd < signal);
        assert!(result.histogram.unwrap() < 0.0);
        assert!((result.histogram.unwrap() - (result.macd - signal)).abs() < 1e-12);
    }

    #[test]
    fn test_signal_needs_nine_macd_values() {
        let series: Vec<f64> = (0..33).map(|x| x as f64).collect();
        assert!(macd(&series).unwrap().signal.is_none());
        let series: Vec<f64> = (0..34).map(|x| x as f64).collect();
        assert!(macd(&series).unwrap().signal.is_some());
    }
}
