//! Port traits the strategy core consumes.

pub mod broker_port;
pub mod config_port;
pub mod data_port;
pub mod event_port;
