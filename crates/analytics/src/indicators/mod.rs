//! Indicator engine: pure functions over a close series ordered oldest first.
//!
//! Every function returns `None` when the series is shorter than its window.
//! There are no partial results.

mod bollinger;
mod macd;
mod moving_average;
mod rsi;

use serde::{Deserialize, Serialize};

pub use bollinger::{
    bollinger_bands, BollingerBands, DEFAULT_BOLLINGER_MULTIPLIER, DEFAULT_BOLLINGER_PERIOD,
};
pub use macd::{macd, Macd, MACD_FAST_PERIOD, MACD_SIGNAL_PERIOD, MACD_SLOW_PERIOD};
pub use moving_average::{ema, sma};
pub use rsi::{rsi, DEFAULT_RSI_PERIOD};

/// Snapshot of the standard indicator set for one close series.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalIndicators {
    pub sma20: Option<f64>,
    pub sma50: Option<f64>,
    pub ema12: Option<f64>,
    pub ema26: Option<f64>,
    pub rsi: Option<f64>,
    pub macd: Option<Macd>,
    pub bollinger: Option<BollingerBands>,
}

impl TechnicalIndicators {
    pub fn from_closes(closes: &[f64]) -> Self {
        Self {
            sma20: sma(closes, 20),
            sma50: sma(closes, 50),
            ema12: ema(closes, MACD_FAST_PERIOD),
            ema26: ema(closes, MACD_SLOW_PERIOD),
            rsi: rsi(closes, DEFAULT_RSI_PERIOD),
            macd: macd(closes),
            bollinger: bollinger_bands(
                closes,
                DEFAULT_BOLLINGER_PERIOD,
                DEFAULT_BOLLINGER_MULTIPLIER,
            ),
        }
    }
}
