//! Market data models
//!
//! - `quote` - Normalized quote and historical bar (Quote, HistoricalPoint)
//! - `period` - Historical request vocabulary (Period, Interval)
//! - `symbol` - Symbol normalization

mod period;
mod quote;
mod symbol;

pub use period::{Interval, Period};
pub use quote::{HistoricalPoint, Quote};
pub use symbol::normalize_symbol;
