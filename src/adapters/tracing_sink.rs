//! Event sink that forwards strategy events to `tracing`.

use tracing::{info, warn};

use crate::domain::event::StrategyEvent;
use crate::ports::event_port::EventSink;

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&mut self, event: &StrategyEvent) {
        let code = event.code();
        let date = event.date();
        match event {
            StrategyEvent::OrderFailed { .. } => warn!(code, %date, "{}", event),
            _ => info!(code, %date, "{}", event),
        }
    }
}
