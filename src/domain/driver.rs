//! Strategy driver: dispatches each bar batch across the basket.

use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::debug;

use crate::domain::event::StrategyEvent;
use crate::domain::indicator::wad::WadState;
use crate::domain::lifecycle::{self, BarContext, SymbolRuntime};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::strategy::SeasonalConfig;
use crate::domain::trade_window::window_for;
use crate::ports::broker_port::BrokerPort;
use crate::ports::event_port::EventSink;

/// The bars delivered for one trading period, keyed by code.
#[derive(Debug, Clone)]
pub struct BarBatch {
    pub date: NaiveDate,
    pub bars: HashMap<String, OhlcvBar>,
}

impl BarBatch {
    pub fn new(date: NaiveDate) -> Self {
        BarBatch {
            date,
            bars: HashMap::new(),
        }
    }

    pub fn from_bars<I: IntoIterator<Item = OhlcvBar>>(date: NaiveDate, bars: I) -> Self {
        BarBatch {
            date,
            bars: bars.into_iter().map(|b| (b.code.clone(), b)).collect(),
        }
    }

    pub fn insert(&mut self, bar: OhlcvBar) {
        self.bars.insert(bar.code.clone(), bar);
    }

    pub fn get(&self, code: &str) -> Option<&OhlcvBar> {
        self.bars.get(code)
    }
}

/// Everything tracked for one symbol, allocated once up front.
#[derive(Debug, Clone)]
pub struct SymbolSlot {
    pub config: SeasonalConfig,
    pub wad: WadState,
    pub runtime: SymbolRuntime,
}

#[derive(Debug, Clone)]
pub struct SeasonalStrategy {
    slots: Vec<SymbolSlot>,
    allocation: f64,
    last_date: Option<NaiveDate>,
}

impl SeasonalStrategy {
    /// Slots keep the basket order given here; every batch is evaluated in
    /// that order.
    pub fn new(basket: Vec<SeasonalConfig>) -> Self {
        let allocation = if basket.is_empty() {
            0.0
        } else {
            1.0 / basket.len() as f64
        };
        let slots = basket
            .into_iter()
            .map(|config| SymbolSlot {
                config,
                wad: WadState::new(),
                runtime: SymbolRuntime::default(),
            })
            .collect();
        SeasonalStrategy {
            slots,
            allocation,
            last_date: None,
        }
    }

    /// Equity fraction given to each entry.
    pub fn allocation(&self) -> f64 {
        self.allocation
    }

    pub fn slots(&self) -> &[SymbolSlot] {
        &self.slots
    }

    pub fn slot(&self, code: &str) -> Option<&SymbolSlot> {
        self.slots.iter().find(|s| s.config.code == code)
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|s| s.config.code.as_str())
    }

    /// Process one batch. Symbols without a bar, or whose bar has no close,
    /// keep their state untouched until the next batch.
    pub fn on_bar(
        &mut self,
        batch: &BarBatch,
        broker: &mut dyn BrokerPort,
        sink: &mut dyn EventSink,
    ) -> Vec<StrategyEvent> {
        self.last_date = Some(batch.date);
        let mut events = Vec::new();

        for slot in &mut self.slots {
            let code = slot.config.code.as_str();
            let Some(bar) = batch.get(code).filter(|b| b.has_close()) else {
                debug!(code, date = %batch.date, "no usable bar, skipping");
                continue;
            };

            let wad = slot.wad.update(bar);
            let Some(window) = window_for(&slot.config, bar.date) else {
                debug!(code, date = %bar.date, "no trade window for date, skipping");
                continue;
            };

            let ctx = BarContext {
                bar,
                wad,
                window: &window,
                allocation: self.allocation,
            };

            for event in lifecycle::step(&slot.config, &mut slot.runtime, &ctx, broker) {
                sink.emit(&event);
                events.push(event);
            }
        }

        events
    }

    /// Report the mark price of every invested symbol. Returns how many
    /// positions are open.
    pub fn on_period_end(&self, broker: &dyn BrokerPort, sink: &mut dyn EventSink) -> usize {
        let Some(date) = self.last_date else {
            return 0;
        };

        let mut open = 0;
        for code in self.codes() {
            let position = broker.position(code);
            if position.invested {
                open += 1;
                sink.emit(&StrategyEvent::EndOfDay {
                    code: code.to_string(),
                    date,
                    price: position.price,
                });
            }
        }
        open
    }
}
