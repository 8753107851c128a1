//! OHLCV bar representation.

use chrono::NaiveDate;

#[derive(Debug, Clone)]
pub struct OhlcvBar {
    pub code: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    /// NaN when the feed delivered the bar without a close.
    pub close: f64,
    pub volume: i64,
}

impl OhlcvBar {
    /// A bar is only tradable when it carries a positive, finite close.
    pub fn has_close(&self) -> bool {
        self.close.is_finite() && self.close > 0.0
    }

    /// max(high, prev_close)
    pub fn true_range_high(&self, prev_close: f64) -> f64 {
        self.high.max(prev_close)
    }

    /// min(low, prev_close)
    pub fn true_range_low(&self, prev_close: f64) -> f64 {
        self.low.min(prev_close)
    }
}
