//! Bollinger Bands.

use serde::{Deserialize, Serialize};

use super::moving_average::sma;
use crate::stats::{population_std_dev, tail};

pub const DEFAULT_BOLLINGER_PERIOD: usize = 20;
pub const DEFAULT_BOLLINGER_MULTIPLIER: f64 = 2.0;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BollingerBands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

/// SMA(`period`) ± `multiplier` × population standard deviation of the last
/// `period` closes.
pub fn bollinger_bands(series: &[f64], period: usize, multiplier: f64) -> Option<BollingerBands> {
    let middle = sma(series, period)?;
    let std_dev = population_std_dev(tail(series, period)?)?;
    let half_width = multiplier * std_dev;

    Some(BollingerBands {
        upper: middle + half_width,
        middle,
        lower: middle - half_width,
    })
}
