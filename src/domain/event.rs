//! Observable strategy events.
//!
//! Events render as plain log lines through `Display`; nothing in the crate
//! parses them back.

use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// Sell date reached.
    Calendar,
    /// Mark price fell to the stop.
    StopLoss,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::Calendar => write!(f, "calendar"),
            ExitReason::StopLoss => write!(f, "stop-loss"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StrategyEvent {
    Entered {
        code: String,
        date: NaiveDate,
        price: f64,
        wad: f64,
        stop_loss: f64,
    },
    StopRaised {
        code: String,
        date: NaiveDate,
        stop_loss: f64,
        trigger: f64,
    },
    Exited {
        code: String,
        date: NaiveDate,
        price: f64,
        stop_loss: f64,
        reason: ExitReason,
    },
    OrderFailed {
        code: String,
        date: NaiveDate,
        reason: String,
    },
    EndOfDay {
        code: String,
        date: NaiveDate,
        price: f64,
    },
}

impl StrategyEvent {
    pub fn code(&self) -> &str {
        match self {
            StrategyEvent::Entered { code, .. }
            | StrategyEvent::StopRaised { code, .. }
            | StrategyEvent::Exited { code, .. }
            | StrategyEvent::OrderFailed { code, .. }
            | StrategyEvent::EndOfDay { code, .. } => code,
        }
    }

    pub fn date(&self) -> NaiveDate {
        match self {
            StrategyEvent::Entered { date, .. }
            | StrategyEvent::StopRaised { date, .. }
            | StrategyEvent::Exited { date, .. }
            | StrategyEvent::OrderFailed { date, .. }
            | StrategyEvent::EndOfDay { date, .. } => *date,
        }
    }
}

impl fmt::Display for StrategyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyEvent::Entered {
                code,
                price,
                wad,
                stop_loss,
                ..
            } => write!(
                f,
                "Bought {code} at {price:.2} wad was {wad:.4}; stop loss set to {stop_loss:.2}"
            ),
            StrategyEvent::StopRaised {
                code,
                stop_loss,
                trigger,
                ..
            } => write!(
                f,
                "Stop loss for {code} set to breakeven {stop_loss:.2} (profit trigger {trigger:.2})"
            ),
            StrategyEvent::Exited {
                code,
                price,
                stop_loss,
                reason: ExitReason::Calendar,
                ..
            } => write!(f, "Sold {code} at {price:.2} (stop was {stop_loss:.2})"),
            StrategyEvent::Exited {
                code,
                price,
                stop_loss,
                reason: ExitReason::StopLoss,
                ..
            } => write!(
                f,
                "Stopped out of {code}: price is {price:.2} and stop was {stop_loss:.2}"
            ),
            StrategyEvent::OrderFailed { code, reason, .. } => {
                write!(f, "Order for {code} failed: {reason}")
            }
            StrategyEvent::EndOfDay { code, price, .. } => {
                write!(f, "End of Day {code} Price: {price:.2}")
            }
        }
    }
}
