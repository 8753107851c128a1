//! Cash, open positions, marks and equity history.

use chrono::NaiveDate;
use std::collections::HashMap;

use super::position::{ClosedTrade, Position};

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub cash: f64,
    pub initial_capital: f64,
    pub positions: HashMap<String, Position>,
    pub marks: HashMap<String, f64>,
    pub closed_trades: Vec<ClosedTrade>,
    pub equity_curve: Vec<EquityPoint>,
}

impl Portfolio {
    pub fn new(initial_capital: f64) -> Self {
        Portfolio {
            cash: initial_capital,
            initial_capital,
            positions: HashMap::new(),
            marks: HashMap::new(),
            closed_trades: Vec::new(),
            equity_curve: Vec::new(),
        }
    }

    pub fn get_position(&self, code: &str) -> Option<&Position> {
        self.positions.get(code)
    }

    pub fn has_position(&self, code: &str) -> bool {
        self.positions.contains_key(code)
    }

    pub fn position_count(&self) -> usize {
        self.positions.len()
    }

    pub fn set_mark(&mut self, code: &str, price: f64) {
        self.marks.insert(code.to_string(), price);
    }

    pub fn mark(&self, code: &str) -> Option<f64> {
        self.marks.get(code).copied()
    }

    /// Buy `quantity` shares at `price`, opening or extending a position.
    pub fn buy(&mut self, code: &str, quantity: i64, price: f64, date: NaiveDate) {
        self.cash -= quantity as f64 * price;
        self.positions
            .entry(code.to_string())
            .and_modify(|pos| pos.add(quantity, price))
            .or_insert_with(|| Position {
                code: code.to_string(),
                quantity,
                average_price: price,
                entry_date: date,
            });
    }

    /// Sell part of a position. Selling the whole position closes it.
    pub fn sell(&mut self, code: &str, quantity: i64, price: f64, date: NaiveDate) {
        let Some(held) = self.positions.get(code).map(|p| p.quantity) else {
            return;
        };
        if quantity >= held {
            self.close(code, price, date);
            return;
        }
        self.cash += quantity as f64 * price;
        if let Some(pos) = self.positions.get_mut(code) {
            pos.add(-quantity, price);
        }
    }

    /// Close the whole position at `price`, recording the round trip.
    pub fn close(&mut self, code: &str, price: f64, date: NaiveDate) -> Option<ClosedTrade> {
        let position = self.positions.remove(code)?;
        self.cash += position.market_value(price);
        let trade = ClosedTrade {
            code: position.code.clone(),
            quantity: position.quantity,
            entry_price: position.average_price,
            exit_price: price,
            entry_date: position.entry_date,
            exit_date: date,
            pnl: position.unrealized_pnl(price),
        };
        self.closed_trades.push(trade.clone());
        Some(trade)
    }

    pub fn record_equity(&mut self, date: NaiveDate, equity: f64) {
        self.equity_curve.push(EquityPoint { date, equity });
    }

    /// Cash plus positions valued at their marks, or at cost when unmarked.
    pub fn total_equity(&self) -> f64 {
        let position_value: f64 = self
            .positions
            .values()
            .map(|pos| {
                let price = self.mark(&pos.code).unwrap_or(pos.average_price);
                pos.market_value(price)
            })
            .sum();
        self.cash + position_value
    }
}
