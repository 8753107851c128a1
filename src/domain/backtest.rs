//! Backtest clock: replays stored bars day by day through the strategy.

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::domain::code_data::{build_unified_timeline, CodeData};
use crate::domain::driver::{BarBatch, SeasonalStrategy};
use crate::domain::event::StrategyEvent;
use crate::domain::execution::SimulatedBroker;
use crate::domain::portfolio::Portfolio;
use crate::ports::broker_port::BrokerPort;
use crate::ports::event_port::EventSink;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_capital: f64,
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub portfolio: Portfolio,
    /// Entries, stop moves, exits and order failures, in order.
    pub events: Vec<StrategyEvent>,
    pub days: usize,
}

/// Run `strategy` over `data` between the configured dates.
///
/// Each day the broker is marked with that day's closes before the strategy
/// sees the batch; the end-of-period hook and the equity snapshot follow.
pub fn run_backtest(
    data: &[CodeData],
    strategy: &mut SeasonalStrategy,
    config: &BacktestConfig,
    sink: &mut dyn EventSink,
) -> BacktestResult {
    let mut broker = SimulatedBroker::new(config.initial_capital);
    let mut events = Vec::new();
    let mut days = 0;

    let timeline = build_unified_timeline(data);
    for date in timeline
        .into_iter()
        .filter(|d| *d >= config.start_date && *d <= config.end_date)
    {
        let mut batch = BarBatch::new(date);
        for cd in data {
            if let Some(bar) = cd.get_bar(date) {
                if bar.has_close() {
                    broker.mark(&cd.code, date, bar.close);
                }
                batch.insert(bar.clone());
            }
        }

        events.extend(strategy.on_bar(&batch, &mut broker, sink));
        let open = strategy.on_period_end(&broker, sink);
        broker.record_equity(date);
        days += 1;
        debug!(%date, open, equity = broker.total_equity(), "period closed");
    }

    let portfolio = broker.into_portfolio();
    info!(
        days,
        trades = portfolio.closed_trades.len(),
        open = portfolio.position_count(),
        "backtest finished"
    );

    BacktestResult {
        portfolio,
        events,
        days,
    }
}
