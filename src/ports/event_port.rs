//! Observability sink port trait.

use crate::domain::event::StrategyEvent;

pub trait EventSink {
    fn emit(&mut self, event: &StrategyEvent);
}

/// Sink that keeps every event, for callers that want the log in memory.
impl EventSink for Vec<StrategyEvent> {
    fn emit(&mut self, event: &StrategyEvent) {
        self.push(event.clone());
    }
}
