//! Brokerage/portfolio port trait.

use crate::domain::error::SeasonalError;

/// What the broker reports about one symbol.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PositionSnapshot {
    pub invested: bool,
    pub quantity: i64,
    pub average_price: f64,
    /// Current mark price; 0.0 when the broker has never seen a price.
    pub price: f64,
}

pub trait BrokerPort {
    fn position(&self, code: &str) -> PositionSnapshot;

    /// Market order sized so that `code` makes up `fraction` of total equity.
    fn set_target_allocation(&mut self, code: &str, fraction: f64) -> Result<(), SeasonalError>;

    /// Market sell of the whole position. Flat symbols are a no-op.
    fn liquidate(&mut self, code: &str) -> Result<(), SeasonalError>;

    fn total_equity(&self) -> f64;
}
