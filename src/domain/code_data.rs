//! Per-code bar history and the unified trading timeline.

use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone)]
pub struct CodeData {
    pub code: String,
    pub ohlcv: Vec<OhlcvBar>,
    pub date_index: HashMap<NaiveDate, usize>,
}

impl CodeData {
    pub fn new(code: String, ohlcv: Vec<OhlcvBar>) -> Self {
        let date_index = ohlcv
            .iter()
            .enumerate()
            .map(|(i, bar)| (bar.date, i))
            .collect();
        Self {
            code,
            ohlcv,
            date_index,
        }
    }

    pub fn bar_count(&self) -> usize {
        self.ohlcv.len()
    }

    pub fn get_bar(&self, date: NaiveDate) -> Option<&OhlcvBar> {
        self.date_index.get(&date).map(|&i| &self.ohlcv[i])
    }
}

/// Every date on which at least one code has a bar, ascending.
pub fn build_unified_timeline(codes: &[CodeData]) -> Vec<NaiveDate> {
    let unique_dates: BTreeSet<NaiveDate> = codes
        .iter()
        .flat_map(|cd| cd.ohlcv.iter().map(|bar| bar.date))
        .collect();
    unique_dates.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_bar(code: &str, date: &str, close: f64) -> OhlcvBar {
        OhlcvBar {
            code: code.to_string(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1000,
        }
    }

    #[test]
    fn get_bar_by_date() {
        let cd = CodeData::new(
            "AMAT".into(),
            vec![
                make_bar("AMAT", "2024-03-13", 98.0),
                make_bar("AMAT", "2024-03-14", 100.0),
            ],
        );
        assert_eq!(cd.bar_count(), 2);
        let d = NaiveDate::from_ymd_opt(2024, 3, 14).unwrap();
        assert_eq!(cd.get_bar(d).unwrap().close, 100.0);
        let missing = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert!(cd.get_bar(missing).is_none());
    }

    #[test]
    fn timeline_merges_and_sorts() {
        let a = CodeData::new(
            "AMAT".into(),
            vec![
                make_bar("AMAT", "2024-03-13", 98.0),
                make_bar("AMAT", "2024-03-15", 100.0),
            ],
        );
        let b = CodeData::new(
            "PG".into(),
            vec![
                make_bar("PG", "2024-03-14", 150.0),
                make_bar("PG", "2024-03-15", 151.0),
            ],
        );
        let timeline = build_unified_timeline(&[a, b]);
        assert_eq!(timeline.len(), 3);
        assert!(timeline.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn timeline_empty() {
        assert!(build_unified_timeline(&[]).is_empty());
    }
}
