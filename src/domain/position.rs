//! Position tracking for the simulated account.

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub code: String,
    pub quantity: i64,
    pub average_price: f64,
    pub entry_date: NaiveDate,
}

impl Position {
    pub fn market_value(&self, price: f64) -> f64 {
        self.quantity as f64 * price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.quantity as f64 * (price - self.average_price)
    }

    /// Add (or, with a negative quantity, remove) shares at `price`. Only
    /// buys move the average entry price.
    pub fn add(&mut self, quantity: i64, price: f64) {
        let total = self.quantity + quantity;
        if quantity > 0 && total > 0 {
            self.average_price = (self.quantity as f64 * self.average_price
                + quantity as f64 * price)
                / total as f64;
        }
        self.quantity = total;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClosedTrade {
    pub code: String,
    pub quantity: i64,
    pub entry_price: f64,
    pub exit_price: f64,
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub pnl: f64,
}

impl ClosedTrade {
    pub fn holding_days(&self) -> i64 {
        (self.exit_date - self.entry_date).num_days()
    }
}
