//! Williams Accumulation/Distribution (WAD) indicator.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::OhlcvBar;

/// Running WAD state for one symbol.
///
/// TRH = max(high, prev_close), TRL = min(low, prev_close)
/// If close > prev_close: AD = close - TRL
/// If close < prev_close: AD = close - TRH
/// If close == prev_close: AD = 0
/// WAD[i] = WAD[i-1] + AD
///
/// The first bar only seeds the previous close and yields 0. The cumulative
/// value is never reset, so it carries across calendar years.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WadState {
    prev_close: Option<f64>,
    cumulative: f64,
}

impl WadState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one bar into the running value and return the updated WAD.
    ///
    /// Callers must filter bars without a close first.
    pub fn update(&mut self, bar: &OhlcvBar) -> f64 {
        let Some(prev_close) = self.prev_close.replace(bar.close) else {
            return 0.0;
        };

        let ad = if bar.close > prev_close {
            bar.close - bar.true_range_low(prev_close)
        } else if bar.close < prev_close {
            bar.close - bar.true_range_high(prev_close)
        } else {
            0.0
        };

        self.cumulative += ad;
        self.cumulative
    }

    pub fn value(&self) -> f64 {
        self.cumulative
    }

    pub fn prev_close(&self) -> Option<f64> {
        self.prev_close
    }

    /// True once at least one bar has been folded in.
    pub fn is_seeded(&self) -> bool {
        self.prev_close.is_some()
    }
}

/// Calculate the WAD series for a bar history.
///
/// Bars without a close are skipped, matching the streaming path. The seeding
/// bar is reported as invalid.
pub fn calculate_wad(bars: &[OhlcvBar]) -> IndicatorSeries {
    let mut state = WadState::new();
    let values = bars
        .iter()
        .filter(|bar| bar.has_close())
        .map(|bar| {
            let valid = state.is_seeded();
            let value = state.update(bar);
            IndicatorPoint {
                date: bar.date,
                valid,
                value,
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Wad,
        values,
    }
}
