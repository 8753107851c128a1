//! Per-symbol position lifecycle: entry, breakeven ratchet, calendar exit
//! and stop-loss exit.
//!
//! The broker is the source of truth for whether a symbol is invested. The
//! only state kept here is the stop-loss price.

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::domain::event::{ExitReason, StrategyEvent};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::strategy::SeasonalConfig;
use crate::domain::trade_window::TradeWindow;
use crate::ports::broker_port::{BrokerPort, PositionSnapshot};

/// Initial stop as a fraction of the entry mark price.
pub const INITIAL_STOP_FRACTION: f64 = 0.95;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Flat,
    Open,
}

impl Phase {
    pub fn of(position: &PositionSnapshot) -> Self {
        if position.invested {
            Phase::Open
        } else {
            Phase::Flat
        }
    }
}

/// Stop-loss price; 0.0 means no stop is active.
///
/// While a position is open the stop only moves up.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StopLoss(f64);

impl StopLoss {
    pub fn price(&self) -> f64 {
        self.0
    }

    pub fn is_set(&self) -> bool {
        self.0 > 0.0
    }

    /// Place the initial stop for a freshly opened position.
    pub fn arm(&mut self, price: f64) {
        self.0 = price;
    }

    /// Returns true when the stop actually moved.
    pub fn raise_to(&mut self, price: f64) -> bool {
        if price > self.0 {
            self.0 = price;
            true
        } else {
            false
        }
    }

    pub fn is_hit(&self, price: f64) -> bool {
        self.is_set() && price <= self.0
    }

    pub fn clear(&mut self) {
        self.0 = 0.0;
    }
}

/// Mutable per-symbol trading state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SymbolRuntime {
    pub stop_loss: StopLoss,
}

/// Inputs for one evaluation of a symbol.
#[derive(Debug, Clone, Copy)]
pub struct BarContext<'a> {
    pub bar: &'a OhlcvBar,
    pub wad: f64,
    pub window: &'a TradeWindow,
    /// Fraction of equity to allocate on entry.
    pub allocation: f64,
}

/// Run the state machine for one symbol on one bar.
///
/// Order matters: entry, ratchet, calendar exit, then the stop check against
/// a fresh position snapshot. Order failures are reported as events and leave
/// the other symbols untouched.
pub fn step(
    config: &SeasonalConfig,
    runtime: &mut SymbolRuntime,
    ctx: &BarContext<'_>,
    broker: &mut dyn BrokerPort,
) -> Vec<StrategyEvent> {
    let code = config.code.as_str();
    let date = ctx.bar.date;
    let mut events = Vec::new();

    let mut position = broker.position(code);
    if Phase::of(&position) == Phase::Flat {
        runtime.stop_loss.clear();
    }

    if Phase::of(&position) == Phase::Flat && ctx.window.in_buy_window(date) && ctx.wad > 0.0 {
        match broker.set_target_allocation(code, ctx.allocation) {
            Ok(()) => {
                position = broker.position(code);
                if position.invested {
                    runtime
                        .stop_loss
                        .arm(position.price * INITIAL_STOP_FRACTION);
                    events.push(StrategyEvent::Entered {
                        code: code.to_string(),
                        date,
                        price: ctx.bar.close,
                        wad: ctx.wad,
                        stop_loss: runtime.stop_loss.price(),
                    });
                }
            }
            Err(e) => {
                warn!(code, %date, error = %e, "entry order failed");
                events.push(StrategyEvent::OrderFailed {
                    code: code.to_string(),
                    date,
                    reason: e.to_string(),
                });
            }
        }
    }

    if Phase::of(&position) == Phase::Flat {
        return events;
    }

    let trigger = position.average_price + config.profit_threshold;
    if ctx.bar.close >= trigger && runtime.stop_loss.raise_to(position.average_price) {
        events.push(StrategyEvent::StopRaised {
            code: code.to_string(),
            date,
            stop_loss: runtime.stop_loss.price(),
            trigger,
        });
    }

    if ctx.window.sell_due(date) {
        debug!(code, %date, sell_date = %ctx.window.sell_date, "sell date reached");
        position = exit(code, date, ExitReason::Calendar, runtime, broker, &mut events);
    }

    if position.invested && runtime.stop_loss.is_hit(position.price) {
        exit(code, date, ExitReason::StopLoss, runtime, broker, &mut events);
    }

    events
}

fn exit(
    code: &str,
    date: NaiveDate,
    reason: ExitReason,
    runtime: &mut SymbolRuntime,
    broker: &mut dyn BrokerPort,
    events: &mut Vec<StrategyEvent>,
) -> PositionSnapshot {
    let price = broker.position(code).price;
    match broker.liquidate(code) {
        Ok(()) => {
            events.push(StrategyEvent::Exited {
                code: code.to_string(),
                date,
                price,
                stop_loss: runtime.stop_loss.price(),
                reason,
            });
            runtime.stop_loss.clear();
        }
        Err(e) => {
            warn!(code, %date, %reason, error = %e, "liquidation failed");
            events.push(StrategyEvent::OrderFailed {
                code: code.to_string(),
                date,
                reason: e.to_string(),
            });
        }
    }
    broker.position(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::SeasonalError;
    use std::collections::HashMap;

    /// Fills every entry at the current mark with a fixed size.
    #[derive(Default)]
    struct FakeBroker {
        marks: HashMap<String, f64>,
        positions: HashMap<String, PositionSnapshot>,
        reject_orders: bool,
        liquidations: usize,
    }

    impl FakeBroker {
        fn mark(&mut self, code: &str, price: f64) {
            self.marks.insert(code.to_string(), price);
            if let Some(p) = self.positions.get_mut(code) {
                p.price = price;
            }
        }
    }

    impl BrokerPort for FakeBroker {
        fn position(&self, code: &str) -> PositionSnapshot {
            self.positions.get(code).copied().unwrap_or(PositionSnapshot {
                price: self.marks.get(code).copied().unwrap_or(0.0),
                ..Default::default()
            })
        }

        fn set_target_allocation(
            &mut self,
            code: &str,
            _fraction: f64,
        ) -> Result<(), SeasonalError> {
            if self.reject_orders {
                return Err(SeasonalError::InsufficientCapital {
                    code: code.to_string(),
                    price: 0.0,
                    target: 0.0,
                });
            }
            let price = self.marks[code];
            self.positions.insert(
                code.to_string(),
                PositionSnapshot {
                    invested: true,
                    quantity: 10,
                    average_price: price,
                    price,
                },
            );
            Ok(())
        }

        fn liquidate(&mut self, code: &str) -> Result<(), SeasonalError> {
            if self.positions.remove(code).is_some() {
                self.liquidations += 1;
            }
            Ok(())
        }

        fn total_equity(&self) -> f64 {
            0.0
        }
    }

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn amat() -> SeasonalConfig {
        SeasonalConfig::new("AMAT", (3, 15), (4, 15), 5.01)
    }

    fn bar(date: NaiveDate, close: f64) -> OhlcvBar {
        OhlcvBar {
            code: "AMAT".into(),
            date,
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1000,
        }
    }

    fn run(
        broker: &mut FakeBroker,
        runtime: &mut SymbolRuntime,
        date: NaiveDate,
        close: f64,
        wad: f64,
    ) -> Vec<StrategyEvent> {
        let config = amat();
        let window = TradeWindow::for_cycle(&config, 2024).unwrap();
        let bar = bar(date, close);
        broker.mark("AMAT", close);
        let ctx = BarContext {
            bar: &bar,
            wad,
            window: &window,
            allocation: 0.5,
        };
        step(&config, runtime, &ctx, broker)
    }

    #[test]
    fn stop_loss_disabled_when_unset() {
        let stop = StopLoss::default();
        assert!(!stop.is_set());
        assert!(!stop.is_hit(0.0));
        assert!(!stop.is_hit(1_000_000.0));
    }

    #[test]
    fn stop_loss_only_rises() {
        let mut stop = StopLoss::default();
        stop.arm(95.0);
        assert!(stop.raise_to(100.0));
        assert!(!stop.raise_to(100.0));
        assert!(!stop.raise_to(90.0));
        assert_eq!(stop.price(), 100.0);
    }

    #[test]
    fn entry_inside_window_with_positive_wad() {
        let mut broker = FakeBroker::default();
        let mut runtime = SymbolRuntime::default();
        let events = run(&mut broker, &mut runtime, date(3, 14), 100.0, 3.0);

        assert!(matches!(events.as_slice(), [StrategyEvent::Entered { wad, .. }] if *wad == 3.0));
        assert!(broker.position("AMAT").invested);
        assert!((runtime.stop_loss.price() - 95.0).abs() < 1e-9);
    }

    #[test]
    fn no_entry_outside_window() {
        let mut broker = FakeBroker::default();
        let mut runtime = SymbolRuntime::default();
        let events = run(&mut broker, &mut runtime, date(3, 11), 100.0, 3.0);
        assert!(events.is_empty());
        assert!(!broker.position("AMAT").invested);
    }

    #[test]
    fn no_entry_without_bullish_wad() {
        let mut broker = FakeBroker::default();
        let mut runtime = SymbolRuntime::default();
        assert!(run(&mut broker, &mut runtime, date(3, 15), 100.0, 0.0).is_empty());
        assert!(run(&mut broker, &mut runtime, date(3, 15), 100.0, -2.0).is_empty());
        assert!(!broker.position("AMAT").invested);
    }

    #[test]
    fn no_second_entry_while_invested() {
        let mut broker = FakeBroker::default();
        let mut runtime = SymbolRuntime::default();
        run(&mut broker, &mut runtime, date(3, 14), 100.0, 3.0);
        let events = run(&mut broker, &mut runtime, date(3, 15), 101.0, 4.0);
        assert!(events.is_empty());
        assert!((broker.position("AMAT").average_price - 100.0).abs() < 1e-9);
    }

    #[test]
    fn breakeven_ratchet_on_profit_trigger() {
        let mut broker = FakeBroker::default();
        let mut runtime = SymbolRuntime::default();
        run(&mut broker, &mut runtime, date(3, 14), 100.0, 3.0);

        let events = run(&mut broker, &mut runtime, date(3, 20), 105.0, 3.0);
        assert!(events.is_empty());
        assert!((runtime.stop_loss.price() - 95.0).abs() < 1e-9);

        let events = run(&mut broker, &mut runtime, date(3, 21), 105.02, 3.0);
        assert!(matches!(events.as_slice(), [StrategyEvent::StopRaised { stop_loss, .. }] if *stop_loss == 100.0));

        // repeating the trigger leaves the stop where it is
        let events = run(&mut broker, &mut runtime, date(3, 22), 106.0, 3.0);
        assert!(events.is_empty());
        assert_eq!(runtime.stop_loss.price(), 100.0);
    }

    #[test]
    fn calendar_exit_above_stop() {
        let mut broker = FakeBroker::default();
        let mut runtime = SymbolRuntime::default();
        run(&mut broker, &mut runtime, date(3, 14), 100.0, 3.0);

        let events = run(&mut broker, &mut runtime, date(4, 15), 120.0, 3.0);
        let exited: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                StrategyEvent::Exited { reason, .. } => Some(*reason),
                _ => None,
            })
            .collect();
        assert_eq!(exited, vec![ExitReason::Calendar]);
        assert!(!broker.position("AMAT").invested);
        assert!(!runtime.stop_loss.is_set());
    }

    #[test]
    fn stop_loss_exit_before_sell_date() {
        let mut broker = FakeBroker::default();
        let mut runtime = SymbolRuntime::default();
        run(&mut broker, &mut runtime, date(3, 14), 100.0, 3.0);
        run(&mut broker, &mut runtime, date(3, 21), 105.02, 3.0);

        let events = run(&mut broker, &mut runtime, date(3, 25), 99.5, 3.0);
        assert!(matches!(
            events.as_slice(),
            [StrategyEvent::Exited { reason: ExitReason::StopLoss, price, .. }] if *price == 99.5
        ));
        assert!(!broker.position("AMAT").invested);
    }

    #[test]
    fn calendar_exit_preempts_stop_exit_on_same_bar() {
        let mut broker = FakeBroker::default();
        let mut runtime = SymbolRuntime::default();
        run(&mut broker, &mut runtime, date(3, 14), 100.0, 3.0);

        let events = run(&mut broker, &mut runtime, date(4, 16), 90.0, 3.0);
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            StrategyEvent::Exited { reason: ExitReason::Calendar, .. }
        ));
        assert_eq!(broker.liquidations, 1);
    }

    #[test]
    fn flat_symbol_past_sell_date_is_untouched() {
        let mut broker = FakeBroker::default();
        let mut runtime = SymbolRuntime::default();
        let events = run(&mut broker, &mut runtime, date(4, 20), 90.0, 3.0);
        assert!(events.is_empty());
        assert_eq!(broker.liquidations, 0);
    }

    #[test]
    fn rejected_entry_reports_failure_and_stays_flat() {
        let mut broker = FakeBroker {
            reject_orders: true,
            ..Default::default()
        };
        let mut runtime = SymbolRuntime::default();
        let events = run(&mut broker, &mut runtime, date(3, 14), 100.0, 3.0);
        assert!(matches!(events.as_slice(), [StrategyEvent::OrderFailed { .. }]));
        assert!(!runtime.stop_loss.is_set());
    }

    #[test]
    fn phase_follows_broker() {
        let flat = PositionSnapshot::default();
        assert_eq!(Phase::of(&flat), Phase::Flat);
        let open = PositionSnapshot {
            invested: true,
            ..Default::default()
        };
        assert_eq!(Phase::of(&open), Phase::Open);
    }
}
