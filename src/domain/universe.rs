//! The traded basket: code list parsing and data coverage.
//!
//! The basket order given in configuration is the order every batch is
//! evaluated in, so parsing preserves it.

use crate::domain::code_data::CodeData;
use crate::domain::error::SeasonalError;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::{info, warn};

#[derive(Debug, Clone, thiserror::Error)]
pub enum BasketError {
    #[error("empty token in code list")]
    EmptyToken,

    #[error("duplicate code: {0}")]
    DuplicateCode(String),
}

/// Split a comma-separated code list, uppercasing each code.
pub fn parse_codes(input: &str) -> Result<Vec<String>, BasketError> {
    let mut codes = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(BasketError::EmptyToken);
        }
        let code = trimmed.to_uppercase();
        if !seen.insert(code.clone()) {
            return Err(BasketError::DuplicateCode(code));
        }
        codes.push(code);
    }

    Ok(codes)
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    NoData,
    LoadFailed(String),
}

#[derive(Debug, Clone)]
pub struct SkippedCode {
    pub code: String,
    pub reason: SkipReason,
}

#[derive(Debug)]
pub struct BasketData {
    pub data: Vec<CodeData>,
    pub skipped: Vec<SkippedCode>,
}

/// Load bars for every code in `[start_date, end_date]`.
///
/// A code without bars still trades nothing, so it is skipped with a warning
/// rather than failing the run. Only a basket where no code has data is an
/// error.
pub fn load_basket_data(
    data_port: &dyn DataPort,
    codes: &[String],
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<BasketData, SeasonalError> {
    let mut data = Vec::new();
    let mut skipped = Vec::new();

    for code in codes {
        let bars = match data_port.fetch_ohlcv(code, start_date, end_date) {
            Ok(bars) => bars,
            Err(e) => {
                warn!(%code, error = %e, "skipping code");
                skipped.push(SkippedCode {
                    code: code.clone(),
                    reason: SkipReason::LoadFailed(e.to_string()),
                });
                continue;
            }
        };

        if bars.is_empty() {
            warn!(%code, "skipping code, no bars in range");
            skipped.push(SkippedCode {
                code: code.clone(),
                reason: SkipReason::NoData,
            });
            continue;
        }

        info!(%code, bars = bars.len(), "loaded");
        data.push(CodeData::new(code.clone(), bars));
    }

    if data.is_empty() {
        return Err(SeasonalError::NoData {
            code: codes.join(","),
        });
    }

    Ok(BasketData { data, skipped })
}
