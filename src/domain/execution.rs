//! Simulated order execution: an in-memory broker that fills market orders
//! at the last mark price.
//!
//! Whole shares only, no commissions and no slippage.

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::domain::error::SeasonalError;
use crate::domain::portfolio::Portfolio;
use crate::ports::broker_port::{BrokerPort, PositionSnapshot};

#[derive(Debug, Clone)]
pub struct SimulatedBroker {
    portfolio: Portfolio,
    as_of: Option<NaiveDate>,
}

impl SimulatedBroker {
    pub fn new(initial_capital: f64) -> Self {
        SimulatedBroker {
            portfolio: Portfolio::new(initial_capital),
            as_of: None,
        }
    }

    /// Update the mark price for `code` and advance the broker clock.
    pub fn mark(&mut self, code: &str, date: NaiveDate, price: f64) {
        self.as_of = Some(date);
        self.portfolio.set_mark(code, price);
    }

    /// Append today's equity to the equity curve.
    pub fn record_equity(&mut self, date: NaiveDate) {
        let equity = self.portfolio.total_equity();
        self.portfolio.record_equity(date, equity);
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    pub fn into_portfolio(self) -> Portfolio {
        self.portfolio
    }

    fn fill_context(&self, code: &str) -> Result<(f64, NaiveDate), SeasonalError> {
        let no_price = || SeasonalError::NoPrice {
            code: code.to_string(),
        };
        let price = self
            .portfolio
            .mark(code)
            .filter(|p| p.is_finite() && *p > 0.0)
            .ok_or_else(no_price)?;
        let date = self.as_of.ok_or_else(no_price)?;
        Ok((price, date))
    }
}

impl BrokerPort for SimulatedBroker {
    fn position(&self, code: &str) -> PositionSnapshot {
        let price = self.portfolio.mark(code).unwrap_or(0.0);
        match self.portfolio.get_position(code) {
            Some(pos) => PositionSnapshot {
                invested: pos.quantity != 0,
                quantity: pos.quantity,
                average_price: pos.average_price,
                price,
            },
            None => PositionSnapshot {
                price,
                ..Default::default()
            },
        }
    }

    fn set_target_allocation(&mut self, code: &str, fraction: f64) -> Result<(), SeasonalError> {
        let (price, date) = self.fill_context(code)?;
        let target_value = self.portfolio.total_equity() * fraction;
        let target_qty = (target_value / price).floor() as i64;
        let held = self
            .portfolio
            .get_position(code)
            .map(|p| p.quantity)
            .unwrap_or(0);

        if target_qty > held {
            let affordable = (self.portfolio.cash / price).floor() as i64;
            let quantity = (target_qty - held).min(affordable);
            if quantity <= 0 {
                return Err(SeasonalError::InsufficientCapital {
                    code: code.to_string(),
                    price,
                    target: target_value,
                });
            }
            self.portfolio.buy(code, quantity, price, date);
            info!(code, %date, quantity, price, "bought");
        } else if target_qty < held {
            let quantity = held - target_qty;
            self.portfolio.sell(code, quantity, price, date);
            info!(code, %date, quantity, price, "sold");
        } else if held == 0 && fraction > 0.0 {
            return Err(SeasonalError::InsufficientCapital {
                code: code.to_string(),
                price,
                target: target_value,
            });
        } else {
            debug!(code, %date, target_qty, "already at target allocation");
        }
        Ok(())
    }

    fn liquidate(&mut self, code: &str) -> Result<(), SeasonalError> {
        if !self.portfolio.has_position(code) {
            return Ok(());
        }
        let (price, date) = self.fill_context(code)?;
        if let Some(trade) = self.portfolio.close(code, price, date) {
            info!(
                code,
                %date,
                quantity = trade.quantity,
                price,
                pnl = trade.pnl,
                "liquidated"
            );
        }
        Ok(())
    }

    fn total_equity(&self) -> f64 {
        self.portfolio.total_equity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn flat_snapshot_reports_mark() {
        let mut broker = SimulatedBroker::new(100_000.0);
        broker.mark("AMAT", day(14), 100.0);
        let snap = broker.position("AMAT");
        assert!(!snap.invested);
        assert_eq!(snap.quantity, 0);
        assert_eq!(snap.price, 100.0);
    }

    #[test]
    fn target_allocation_buys_whole_shares() {
        let mut broker = SimulatedBroker::new(100_000.0);
        broker.mark("AMAT", day(14), 300.0);
        broker.set_target_allocation("AMAT", 0.25).unwrap();

        let snap = broker.position("AMAT");
        assert!(snap.invested);
        // 25_000 / 300 = 83.33 → 83 shares
        assert_eq!(snap.quantity, 83);
        assert_eq!(snap.average_price, 300.0);
        assert!((broker.portfolio().cash - (100_000.0 - 83.0 * 300.0)).abs() < 1e-9);
        assert!((broker.total_equity() - 100_000.0).abs() < 1e-9);
    }

    #[test]
    fn target_allocation_without_mark_fails() {
        let mut broker = SimulatedBroker::new(100_000.0);
        let err = broker.set_target_allocation("AMAT", 0.25).unwrap_err();
        assert!(matches!(err, SeasonalError::NoPrice { code } if code == "AMAT"));
    }

    #[test]
    fn target_allocation_too_small_fails() {
        let mut broker = SimulatedBroker::new(1_000.0);
        broker.mark("BKNG", day(14), 3_000.0);
        let err = broker.set_target_allocation("BKNG", 0.5).unwrap_err();
        assert!(matches!(err, SeasonalError::InsufficientCapital { .. }));
        assert!(!broker.position("BKNG").invested);
    }

    #[test]
    fn target_allocation_capped_by_cash() {
        let mut broker = SimulatedBroker::new(10_000.0);
        broker.mark("AMAT", day(14), 100.0);
        broker.mark("PG", day(14), 100.0);
        broker.set_target_allocation("AMAT", 0.8).unwrap();
        // equity 10_000, target 8_000 but only 2_000 cash left
        broker.set_target_allocation("PG", 0.8).unwrap();
        assert_eq!(broker.position("PG").quantity, 20);
        assert!(broker.portfolio().cash.abs() < 1e-9);
    }

    #[test]
    fn lower_target_sells_down() {
        let mut broker = SimulatedBroker::new(10_000.0);
        broker.mark("AMAT", day(14), 100.0);
        broker.set_target_allocation("AMAT", 0.5).unwrap();
        broker.set_target_allocation("AMAT", 0.2).unwrap();
        assert_eq!(broker.position("AMAT").quantity, 20);
    }

    #[test]
    fn liquidate_records_trade_at_mark() {
        let mut broker = SimulatedBroker::new(10_000.0);
        broker.mark("AMAT", day(14), 100.0);
        broker.set_target_allocation("AMAT", 0.5).unwrap();
        broker.mark("AMAT", day(20), 110.0);
        broker.liquidate("AMAT").unwrap();

        assert!(!broker.position("AMAT").invested);
        let trades = &broker.portfolio().closed_trades;
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].entry_date, day(14));
        assert_eq!(trades[0].exit_date, day(20));
        assert!((trades[0].pnl - 500.0).abs() < 1e-9);
    }

    #[test]
    fn liquidate_twice_is_idempotent() {
        let mut broker = SimulatedBroker::new(10_000.0);
        broker.mark("AMAT", day(14), 100.0);
        broker.set_target_allocation("AMAT", 0.5).unwrap();
        broker.liquidate("AMAT").unwrap();
        let once = broker.portfolio().clone();
        broker.liquidate("AMAT").unwrap();
        assert_eq!(broker.portfolio(), &once);
    }

    #[test]
    fn liquidate_flat_without_mark_is_noop() {
        let mut broker = SimulatedBroker::new(10_000.0);
        assert!(broker.liquidate("AMAT").is_ok());
    }

    #[test]
    fn record_equity_uses_marks() {
        let mut broker = SimulatedBroker::new(10_000.0);
        broker.mark("AMAT", day(14), 100.0);
        broker.set_target_allocation("AMAT", 0.5).unwrap();
        broker.mark("AMAT", day(15), 120.0);
        broker.record_equity(day(15));
        let curve = &broker.portfolio().equity_curve;
        assert_eq!(curve.len(), 1);
        assert!((curve[0].equity - 11_000.0).abs() < 1e-9);
    }
}
