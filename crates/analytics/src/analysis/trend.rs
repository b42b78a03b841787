use std::fmt;

use serde::{Deserialize, Serialize};

use super::MIN_ANALYSIS_POINTS;
use crate::stats::mean;

/// Number of closes in each of the two compared windows.
pub const TREND_WINDOW: usize = 10;

const STRONG_MOVE_PCT: f64 = 2.0;
const MOVE_PCT: f64 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trend {
    #[serde(rename = "strong uptrend")]
    StrongUptrend,
    #[serde(rename = "uptrend")]
    Uptrend,
    #[serde(rename = "sideways")]
    Sideways,
    #[serde(rename = "downtrend")]
    Downtrend,
    #[serde(rename = "strong downtrend")]
    StrongDowntrend,
    #[serde(rename = "unknown")]
    Unknown,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::StrongUptrend => "strong uptrend",
            Trend::Uptrend => "uptrend",
            Trend::Sideways => "sideways",
            Trend::Downtrend => "downtrend",
            Trend::StrongDowntrend => "strong downtrend",
            Trend::Unknown => "unknown",
        }
    }

    fn from_change_pct(change_pct: f64) -> Self {
        if change_pct > STRONG_MOVE_PCT {
            Trend::StrongUptrend
        } else if change_pct > MOVE_PCT {
            Trend::Uptrend
        } else if change_pct < -STRONG_MOVE_PCT {
            Trend::StrongDowntrend
        } else if change_pct < -MOVE_PCT {
            Trend::Downtrend
        } else {
            Trend::Sideways
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify the trend by comparing the mean of the last 10 closes with the
/// mean of the 10 before them.
///
/// `Unknown` for fewer than 20 closes, or when the earlier window averages to
/// zero and no percentage change exists.
pub fn trend(closes: &[f64]) -> Trend {
    if closes.len() < MIN_ANALYSIS_POINTS {
        return Trend::Unknown;
    }

    let split = closes.len() - TREND_WINDOW;
    let recent = mean(&closes[split..]);
    let prior = mean(&closes[split - TREND_WINDOW..split]);

    match (recent, prior) {
        (Some(recent), Some(prior)) if prior != 0.0 => {
            Trend::from_change_pct((recent - prior) / prior * 100.0)
        }
        _ => Trend::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_windows(prior: f64, recent: f64) -> Vec<f64> {
        let mut closes = vec![prior; TREND_WINDOW];
        closes.extend(vec![recent; TREND_WINDOW]);
        closes
    }

    #[test]
    fn test_trend_requires_twenty_points() {
        assert_eq!(trend(&vec![100.0; 19]), Trend::Unknown);
        assert_eq!(trend(&[]), Trend::Unknown);
    }

    #[test]
    fn test_trend_thresholds() {
        assert_eq!(trend(&two_windows(100.0, 103.0)), Trend::StrongUptrend);
        assert_eq!(trend(&two_windows(100.0, 101.0)), Trend::Uptrend);
        assert_eq!(trend(&two_windows(100.0, 100.2)), Trend::Sideways);
        assert_eq!(trend(&two_windows(100.0, 99.0)), Trend::Downtrend);
        assert_eq!(trend(&two_windows(100.0, 97.0)), Trend::StrongDowntrend);
    }

    #[test]
    fn test_trend_ignores_older_points() {
        let mut closes = vec![10.0; 30];
        closes.extend(two_windows(100.0, 100.0));
        assert_eq!(trend(&closes), Trend::Sideways);
    }

    #[test]
    fn test_trend_zero_prior_window() {
        assert_eq!(trend(&two_windows(0.0, 5.0)), Trend::Unknown);
    }

    #[test]
    fn test_trend_serializes_as_label() {
        assert_eq!(
            serde_json::to_string(&Trend::StrongUptrend).unwrap(),
            "\"strong uptrend\""
        );
        assert_eq!(Trend::Unknown.to_string(), "unknown");
    }
}
