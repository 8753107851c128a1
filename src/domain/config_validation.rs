//! Configuration validation.
//!
//! Everything is checked at load so the strategy core can assume a valid
//! basket. The `build_*` functions validate and return the typed values; the
//! `validate_*` wrappers only report the first problem.

use crate::domain::backtest::BacktestConfig;
use crate::domain::error::SeasonalError;
use crate::domain::strategy::{MonthDay, SeasonalConfig};
use crate::domain::universe::parse_codes;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub const BACKTEST_SECTION: &str = "backtest";

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), SeasonalError> {
    build_backtest_config(config).map(|_| ())
}

pub fn validate_basket_config(config: &dyn ConfigPort) -> Result<(), SeasonalError> {
    let codes = configured_codes(config)?;
    build_basket(config, &codes).map(|_| ())
}

pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, SeasonalError> {
    let initial_capital = validate_initial_capital(config)?;
    let (start_date, end_date) = validate_dates(config)?;
    configured_codes(config)?;
    Ok(BacktestConfig {
        start_date,
        end_date,
        initial_capital,
    })
}

/// The `codes` list of the backtest section, in basket order.
pub fn configured_codes(config: &dyn ConfigPort) -> Result<Vec<String>, SeasonalError> {
    match config.get_string(BACKTEST_SECTION, "codes") {
        Some(s) if !s.trim().is_empty() => Ok(parse_codes(&s)?),
        _ => Err(missing(BACKTEST_SECTION, "codes")),
    }
}

/// One `SeasonalConfig` per code, read from the section named after it.
pub fn build_basket(
    config: &dyn ConfigPort,
    codes: &[String],
) -> Result<Vec<SeasonalConfig>, SeasonalError> {
    codes
        .iter()
        .map(|code| build_symbol(config, code))
        .collect()
}

fn build_symbol(config: &dyn ConfigPort, code: &str) -> Result<SeasonalConfig, SeasonalError> {
    if !config.has_section(code) {
        return Err(SeasonalError::ConfigMissing {
            section: code.to_string(),
            key: "buy".to_string(),
        });
    }

    let buy = parse_month_day(config, code, "buy")?;
    let sell = parse_month_day(config, code, "sell")?;
    if buy == sell {
        return Err(invalid(code, "sell", "sell date must differ from buy date"));
    }

    let raw = config
        .get_string(code, "profit")
        .ok_or_else(|| missing(code, "profit"))?;
    let profit_threshold: f64 = raw
        .trim()
        .parse()
        .map_err(|_| invalid(code, "profit", &format!("'{}' is not a number", raw.trim())))?;
    if !profit_threshold.is_finite() || profit_threshold < 0.0 {
        return Err(invalid(code, "profit", "profit must be non-negative"));
    }

    Ok(SeasonalConfig {
        code: code.to_string(),
        buy,
        sell,
        profit_threshold,
    })
}

fn parse_month_day(config: &dyn ConfigPort, section: &str, key: &str) -> Result<MonthDay, SeasonalError> {
    let raw = config
        .get_string(section, key)
        .ok_or_else(|| missing(section, key))?;
    raw.parse().map_err(|reason: String| invalid(section, key, &reason))
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<f64, SeasonalError> {
    let value = config.get_double(BACKTEST_SECTION, "initial_capital", 0.0);
    if value <= 0.0 || !value.is_finite() {
        return Err(invalid(
            BACKTEST_SECTION,
            "initial_capital",
            "initial_capital must be positive",
        ));
    }
    Ok(value)
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(NaiveDate, NaiveDate), SeasonalError> {
    let start_str = config.get_string(BACKTEST_SECTION, "start_date");
    let end_str = config.get_string(BACKTEST_SECTION, "end_date");

    let start_date = parse_date(start_str.as_deref(), "start_date")?;
    let end_date = parse_date(end_str.as_deref(), "end_date")?;

    if start_date >= end_date {
        return Err(invalid(
            BACKTEST_SECTION,
            "start_date",
            "start_date must be before end_date",
        ));
    }
    Ok((start_date, end_date))
}

fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, SeasonalError> {
    match value {
        None => Err(missing(BACKTEST_SECTION, field)),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            invalid(
                BACKTEST_SECTION,
                field,
                &format!("invalid {} format, expected YYYY-MM-DD", field),
            )
        }),
    }
}

fn missing(section: &str, key: &str) -> SeasonalError {
    SeasonalError::ConfigMissing {
        section: section.to_string(),
        key: key.to_string(),
    }
}

fn invalid(section: &str, key: &str, reason: &str) -> SeasonalError {
    SeasonalError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
