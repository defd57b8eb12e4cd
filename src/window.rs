// src/window.rs

use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveDateTime};
use std::fmt;

use crate::error::ConfigError;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Naive ISO timestamps accepted in addition to RFC 3339.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse a window bound into a calendar date, discarding the time of day.
///
/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps (`Z` or an explicit offset, the
/// date is taken in that offset) and naive ISO timestamps.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, DATE_FORMAT) {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|dt| dt.date())
}

fn parse_bound(which: &'static str, raw: Option<&str>) -> Result<NaiveDate, ConfigError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(ConfigError::MissingWindowBound(which))?;
    parse_date(raw).ok_or_else(|| ConfigError::InvalidWindowBound {
        which,
        value: raw.to_string(),
    })
}

pub fn first_of_month(d: NaiveDate) -> NaiveDate {
    d.with_day(1).unwrap_or(d)
}

/// `YYYY-MM`, zero padded.
pub fn year_month(d: NaiveDate) -> String {
    format!("{:04}-{:02}", d.year(), d.month())
}

/// Half-open run window `[start, end)` at day resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl RunWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Parse both bounds. Either one missing, blank or unreadable is fatal.
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Result<Self, ConfigError> {
        let start = parse_bound("start", start)?;
        let end = parse_bound("end", end)?;
        Ok(Self { start, end })
    }

    /// First-of-month dates `m` with `month(start) <= m < end` and
    /// `m <= ceiling`, ascending.
    ///
    /// A window covering only part of a month still yields that month, since
    /// the upstream files are monthly.
    pub fn months(&self, ceiling: NaiveDate) -> Vec<NaiveDate> {
        let mut months = Vec::new();
        let mut cursor = first_of_month(self.start);
        while cursor < self.end && cursor <= ceiling {
            months.push(cursor);
            match cursor.checked_add_months(Months::new(1)) {
                Some(next) => cursor = next,
                None => break,
            }
        }
        months
    }
}

impl fmt::Display for RunWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}
