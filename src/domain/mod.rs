//! Core domain types and logic.

pub mod ohlcv;
pub mod indicator;
pub mod strategy;
pub mod trade_window;
pub mod event;
pub mod lifecycle;
pub mod driver;
pub mod position;
pub mod portfolio;
pub mod execution;
pub mod code_data;
pub mod backtest;
pub mod metrics;
pub mod universe;
pub mod config_validation;
pub mod error;
