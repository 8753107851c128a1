//! Run summary statistics.

use super::portfolio::{EquityPoint, Portfolio};
use super::position::ClosedTrade;
use std::collections::BTreeMap;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Win/loss breakdown of a set of closed trades.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TradeStats {
    pub won: usize,
    pub lost: usize,
    pub breakeven: usize,
    pub gross_profit: f64,
    pub gross_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub total_holding_days: i64,
}

impl TradeStats {
    pub fn from_trades<'a, I: IntoIterator<Item = &'a ClosedTrade>>(trades: I) -> Self {
        trades.into_iter().fold(TradeStats::default(), |mut s, t| {
            if t.pnl > 0.0 {
                s.won += 1;
                s.gross_profit += t.pnl;
                s.largest_win = s.largest_win.max(t.pnl);
            } else if t.pnl < 0.0 {
                s.lost += 1;
                s.gross_loss += -t.pnl;
                s.largest_loss = s.largest_loss.max(-t.pnl);
            } else {
                s.breakeven += 1;
            }
            s.total_holding_days += t.holding_days();
            s
        })
    }

    pub fn total(&self) -> usize {
        self.won + self.lost + self.breakeven
    }

    pub fn net_pnl(&self) -> f64 {
        self.gross_profit - self.gross_loss
    }

    pub fn win_rate(&self) -> f64 {
        ratio(self.won as f64, self.total() as f64)
    }

    pub fn profit_factor(&self) -> f64 {
        if self.gross_loss > 0.0 {
            self.gross_profit / self.gross_loss
        } else if self.gross_profit > 0.0 {
            f64::INFINITY
        } else {
            0.0
        }
    }

    pub fn avg_win(&self) -> f64 {
        ratio(self.gross_profit, self.won as f64)
    }

    pub fn avg_loss(&self) -> f64 {
        ratio(self.gross_loss, self.lost as f64)
    }

    pub fn avg_holding_days(&self) -> f64 {
        ratio(self.total_holding_days as f64, self.total() as f64)
    }
}

fn ratio(num: f64, den: f64) -> f64 {
    if den > 0.0 { num / den } else { 0.0 }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub final_equity: f64,
    pub total_return: f64,
    pub annualized_return: f64,
    pub max_drawdown: f64,
    /// Longest run of consecutive days below a prior peak.
    pub max_drawdown_duration: i64,
    pub trades: TradeStats,
}

impl Metrics {
    pub fn compute(portfolio: &Portfolio) -> Self {
        let initial_capital = portfolio.initial_capital;
        let final_equity = portfolio
            .equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(initial_capital);

        let total_return = ratio(final_equity - initial_capital, initial_capital);

        let years = portfolio.equity_curve.len() as f64 / TRADING_DAYS_PER_YEAR;
        let annualized_return = if years > 0.0 && total_return > -1.0 {
            (1.0 + total_return).powf(1.0 / years) - 1.0
        } else {
            0.0
        };

        let (max_drawdown, max_drawdown_duration) = compute_drawdown(&portfolio.equity_curve);

        Metrics {
            final_equity,
            total_return,
            annualized_return,
            max_drawdown,
            max_drawdown_duration,
            trades: TradeStats::from_trades(&portfolio.closed_trades),
        }
    }
}

fn compute_drawdown(equity_curve: &[EquityPoint]) -> (f64, i64) {
    let Some(first) = equity_curve.first() else {
        return (0.0, 0);
    };

    let mut peak = first.equity;
    let mut max_dd = 0.0_f64;
    let mut run = 0i64;
    let mut max_run = 0i64;

    for point in equity_curve {
        if point.equity >= peak {
            peak = point.equity;
            run = 0;
        } else if peak > 0.0 {
            max_dd = max_dd.max((peak - point.equity) / peak);
            run += 1;
            max_run = max_run.max(run);
        }
    }

    (max_dd, max_run)
}

/// Per-symbol trade summary.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeResult {
    pub code: String,
    pub stats: TradeStats,
}

impl CodeResult {
    /// One entry per traded code, sorted by code.
    pub fn compute_per_code(trades: &[ClosedTrade]) -> Vec<CodeResult> {
        let mut by_code: BTreeMap<&str, Vec<&ClosedTrade>> = BTreeMap::new();
        for trade in trades {
            by_code.entry(trade.code.as_str()).or_default().push(trade);
        }
        by_code
            .into_iter()
            .map(|(code, trades)| CodeResult {
                code: code.to_string(),
                stats: TradeStats::from_trades(trades),
            })
            .collect()
    }
}
