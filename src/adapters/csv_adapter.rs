//! CSV file data adapter.
//!
//! One file per code at `<base_path>/<CODE>.csv` with a header row naming
//! `date,open,high,low,close` and optionally `volume`. Columns may appear in
//! any order. An empty close field loads as a bar without a close.

use crate::domain::error::SeasonalError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

struct Columns {
    date: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord, path: &str) -> Result<Self, SeasonalError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        let require = |name: &str| {
            find(name).ok_or_else(|| SeasonalError::Data {
                reason: format!("{}: missing {} column", path, name),
            })
        };
        Ok(Columns {
            date: require("date")?,
            open: require("open")?,
            high: require("high")?,
            low: require("low")?,
            close: require("close")?,
            volume: find("volume"),
        })
    }
}

fn field<'r>(record: &'r csv::StringRecord, idx: usize, name: &str) -> Result<&'r str, SeasonalError> {
    record
        .get(idx)
        .map(str::trim)
        .ok_or_else(|| SeasonalError::Data {
            reason: format!("missing {} value", name),
        })
}

fn parse_price(record: &csv::StringRecord, idx: usize, name: &str) -> Result<f64, SeasonalError> {
    field(record, idx, name)?
        .parse()
        .map_err(|e| SeasonalError::Data {
            reason: format!("invalid {} value: {}", name, e),
        })
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, code: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", code))
    }

    fn read_all(&self, code: &str) -> Result<Vec<OhlcvBar>, SeasonalError> {
        let path = self.csv_path(code);
        let content = fs::read_to_string(&path).map_err(|e| SeasonalError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr.headers().map_err(|e| SeasonalError::Data {
            reason: format!("CSV header error: {}", e),
        })?;
        let cols = Columns::from_headers(headers, &path.display().to_string())?;

        let mut bars = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| SeasonalError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;

            let date = NaiveDate::parse_from_str(field(&record, cols.date, "date")?, "%Y-%m-%d")
                .map_err(|e| SeasonalError::Data {
                    reason: format!("invalid date format: {}", e),
                })?;

            let close = match field(&record, cols.close, "close")? {
                "" => f64::NAN,
                _ => parse_price(&record, cols.close, "close")?,
            };

            let volume = match cols.volume {
                Some(idx) => match field(&record, idx, "volume")? {
                    "" => 0,
                    v => v.parse().map_err(|e| SeasonalError::Data {
                        reason: format!("invalid volume value: {}", e),
                    })?,
                },
                None => 0,
            };

            bars.push(OhlcvBar {
                code: code.to_string(),
                date,
                open: parse_price(&record, cols.open, "open")?,
                high: parse_price(&record, cols.high, "high")?,
                low: parse_price(&record, cols.low, "low")?,
                close,
                volume,
            });
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, SeasonalError> {
        let mut bars = self.read_all(code)?;
        bars.retain(|b| b.date >= start_date && b.date <= end_date);
        Ok(bars)
    }

    fn get_data_range(
        &self,
        code: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, SeasonalError> {
        if !self.csv_path(code).exists() {
            return Ok(None);
        }
        let bars = self.read_all(code)?;
        Ok(match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date, bars.len())),
            _ => None,
        })
    }
}
