//! Simple and exponential moving averages over a close series.

use crate::stats::{mean, tail};

/// Simple moving average: arithmetic mean of the last `period` values.
///
/// Returns `None` when the series is shorter than `period` or `period` is 0.
pub fn sma(series: &[f64], period: usize) -> Option<f64> {
    mean(tail(series, period)?)
}

/// Exponential moving average of the whole series.
///
/// Seeded with the first value, then `ema = value * k + ema * (1 - k)` with
/// `k = 2 / (period + 1)` over every later value. The result depends on the
/// full history supplied, so callers should pass enough points for the seed
/// to wash out.
pub fn ema(series: &[f64], period: usize) -> Option<f64> {
    if period == 0 || series.len() < period {
        return None;
    }
    ema_series(series, period).last().copied()
}

/// Running EMA value at every index of `series`, same seeding as [`ema`].
///
/// No length check is applied; index `i` is the EMA of `series[..=i]`.
pub(crate) fn ema_series(series: &[f64], period: usize) -> Vec<f64> {
    let k = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(series.len());
    let mut iter = series.iter();

    if let Some(&first) = iter.next() {
        let mut current = first;
        out.push(current);
        for &value in iter {
            current = value * k + current * (1.0 - k);
            out.push(current);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_sma_insufficient_data() {
        let series: Vec<f64> = (1..=15).map(|x| x as f64).collect();
        assert!(sma(&series, 20).is_none());
        assert!(sma(&series, 0).is_none());
    }

    #[test]
    fn test_sma_uses_last_values() {
        let series: Vec<f64> = (1..=15).map(|x| x as f64).collect();
        // last 10 values: 6..=15, mean 10.5
        assert_eq!(sma(&series, 10), Some(10.5));
        assert_eq!(sma(&series, 15), Some(8.0));
    }

    #[test]
    fn test_ema_constant_series() {
        let series = vec![50.0; 30];
        assert!(close(ema(&series, 12).unwrap(), 50.0));
    }

    #[test]
    fn test_ema_recurrence() {
        // k = 2 / (3 + 1) = 0.5
        // seed 1.0 -> 1.5 -> 2.25
        let series = [1.0, 2.0, 3.0];
        assert!(close(ema(&series, 3).unwrap(), 2.25));
    }

    #[test]
    fn test_ema_insufficient_data() {
        assert!(ema(&[1.0, 2.0], 3).is_none());
    }

    #[test]
    fn test_ema_series_matches_ema() {
        let series: Vec<f64> = (0..40).map(|x| (x as f64).sin() * 10.0 + 100.0).collect();
        let running = ema_series(&series, 12);
        assert_eq!(running.len(), series.len());
        assert!(close(*running.last().unwrap(), ema(&series, 12).unwrap()));
        assert!(close(running[20], ema(&series[..21], 12).unwrap()));
    }
}
