//! Per-symbol seasonal configuration.

use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

/// A calendar anchor without a year, written `MM-DD` in config files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthDay {
    pub month: u32,
    pub day: u32,
}

impl MonthDay {
    pub fn new(month: u32, day: u32) -> Self {
        MonthDay { month, day }
    }

    /// Valid in at least one year (Feb 29 counts).
    pub fn is_valid(&self) -> bool {
        NaiveDate::from_ymd_opt(2000, self.month, self.day).is_some()
    }

    /// Resolve against a year. Feb 29 falls back to Feb 28 outside leap years.
    pub fn in_year(&self, year: i32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(year, self.month, self.day).or_else(|| {
            if self.month == 2 && self.day == 29 {
                NaiveDate::from_ymd_opt(year, 2, 28)
            } else {
                None
            }
        })
    }
}

impl FromStr for MonthDay {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (m, d) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| format!("expected MM-DD, got '{}'", s.trim()))?;
        let month: u32 = m
            .trim()
            .parse()
            .map_err(|_| format!("invalid month '{}'", m.trim()))?;
        let day: u32 = d
            .trim()
            .parse()
            .map_err(|_| format!("invalid day '{}'", d.trim()))?;
        let md = MonthDay::new(month, day);
        if !md.is_valid() {
            return Err(format!("{:02}-{:02} is not a calendar date", month, day));
        }
        Ok(md)
    }
}

impl fmt::Display for MonthDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:02}", self.month, self.day)
    }
}

/// Immutable trading parameters for one symbol of the basket.
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonalConfig {
    pub code: String,
    pub buy: MonthDay,
    pub sell: MonthDay,
    /// Absolute price gain over the average entry that arms the breakeven stop.
    pub profit_threshold: f64,
}

impl SeasonalConfig {
    pub fn new(code: &str, buy: (u32, u32), sell: (u32, u32), profit_threshold: f64) -> Self {
        SeasonalConfig {
            code: code.to_string(),
            buy: MonthDay::new(buy.0, buy.1),
            sell: MonthDay::new(sell.0, sell.1),
            profit_threshold,
        }
    }

    /// The holding period crosses a year boundary (e.g. buy in December,
    /// sell in January).
    pub fn wraps_year(&self) -> bool {
        self.sell < self.buy
    }
}
