#![allow(dead_code)]

use chrono::NaiveDate;
use seasontrader::domain::backtest::BacktestConfig;
use seasontrader::domain::code_data::CodeData;
use seasontrader::domain::error::SeasonalError;
pub use seasontrader::domain::ohlcv::OhlcvBar;
use seasontrader::domain::strategy::SeasonalConfig;
use seasontrader::ports::data_port::DataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, code: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(code.to_string(), bars);
        self
    }

    pub fn with_error(mut self, code: &str, reason: &str) -> Self {
        self.errors.insert(code.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, SeasonalError> {
        if let Some(reason) = self.errors.get(code) {
            return Err(SeasonalError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(code)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start_date && b.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn get_data_range(
        &self,
        code: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, SeasonalError> {
        if let Some(reason) = self.errors.get(code) {
            return Err(SeasonalError::Data {
                reason: reason.clone(),
            });
        }
        match self.data.get(code) {
            Some(bars) if !bars.is_empty() => {
                let min = bars.iter().map(|b| b.date).min().unwrap();
                let max = bars.iter().map(|b| b.date).max().unwrap();
                Ok(Some((min, max, bars.len())))
            }
            _ => Ok(None),
        }
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Bar with an explicit low; high sits one above the close.
pub fn make_bar(code: &str, day: NaiveDate, close: f64, low: f64) -> OhlcvBar {
    OhlcvBar {
        code: code.to_string(),
        date: day,
        open: close,
        high: close + 1.0,
        low,
        close,
        volume: 1000,
    }
}

pub fn make_flat_bar(code: &str, day: NaiveDate, close: f64) -> OhlcvBar {
    make_bar(code, day, close, close - 1.0)
}

pub fn make_no_close_bar(code: &str, day: NaiveDate) -> OhlcvBar {
    OhlcvBar {
        close: f64::NAN,
        ..make_bar(code, day, 0.0, 0.0)
    }
}

pub fn make_code_data(code: &str, bars: Vec<OhlcvBar>) -> CodeData {
    CodeData::new(code.to_string(), bars)
}

/// One bar per calendar day with closes taken from `closes`.
pub fn daily_bars(code: &str, start: NaiveDate, closes: &[f64]) -> Vec<OhlcvBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            make_flat_bar(code, start + chrono::Duration::days(i as i64), close)
        })
        .collect()
}

/// Rising closes, one calendar day apart.
pub fn generate_bars(code: &str, start: NaiveDate, count: usize, start_price: f64) -> Vec<OhlcvBar> {
    let closes: Vec<f64> = (0..count).map(|i| start_price + i as f64).collect();
    daily_bars(code, start, &closes)
}

pub fn amat() -> SeasonalConfig {
    SeasonalConfig::new("AMAT", (3, 15), (4, 15), 5.01)
}

pub fn ter() -> SeasonalConfig {
    SeasonalConfig::new("TER", (12, 5), (1, 15), 5.30)
}

pub fn vfc() -> SeasonalConfig {
    SeasonalConfig::new("VFC", (1, 1), (2, 10), 4.90)
}

pub fn sample_config(start: NaiveDate, end: NaiveDate) -> BacktestConfig {
    BacktestConfig {
        start_date: start,
        end_date: end,
        initial_capital: 100_000.0,
    }
}
