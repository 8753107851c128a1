//! Buy window and sell date for a symbol on a given day.

use chrono::{Datelike, Duration, NaiveDate};

use crate::domain::strategy::SeasonalConfig;

/// Days on either side of the buy anchor during which entry is allowed.
pub const BUY_WINDOW_DAYS: i64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradeWindow {
    /// Year the buy anchor was resolved against.
    pub cycle_year: i32,
    pub buy_date: NaiveDate,
    pub buy_start: NaiveDate,
    pub buy_end: NaiveDate,
    pub sell_date: NaiveDate,
}

impl TradeWindow {
    /// Window anchored on `cycle_year`'s buy date. The sell date rolls into
    /// the following year when it would otherwise precede the buy date.
    pub fn for_cycle(config: &SeasonalConfig, cycle_year: i32) -> Option<Self> {
        let buy_date = config.buy.in_year(cycle_year)?;
        let mut sell_date = config.sell.in_year(cycle_year)?;
        if sell_date < buy_date {
            sell_date = config.sell.in_year(cycle_year + 1)?;
        }
        Some(TradeWindow {
            cycle_year,
            buy_date,
            buy_start: buy_date - Duration::days(BUY_WINDOW_DAYS),
            buy_end: buy_date + Duration::days(BUY_WINDOW_DAYS),
            sell_date,
        })
    }

    pub fn in_buy_window(&self, date: NaiveDate) -> bool {
        self.buy_start <= date && date <= self.buy_end
    }

    pub fn sell_due(&self, date: NaiveDate) -> bool {
        date >= self.sell_date
    }
}

/// The window in force on `date`: the latest cycle whose buy window has
/// already opened.
///
/// Checking `year + 1` catches buy windows that open in late December for a
/// January anchor; falling back to `year - 1` keeps a December-to-January
/// holding period pointed at its own sell date after New Year.
pub fn window_for(config: &SeasonalConfig, date: NaiveDate) -> Option<TradeWindow> {
    let year = date.year();
    for cycle_year in [year + 1, year, year - 1] {
        let window = TradeWindow::for_cycle(config, cycle_year)?;
        if window.buy_start <= date {
            return Some(window);
        }
    }
    None
}
