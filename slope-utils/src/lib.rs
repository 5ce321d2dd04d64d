//! Shared utility functions for the slope crates.

/// Date utility functions
pub mod dates {
    use crate::error::DateError;
    use chrono::{Datelike, Duration, NaiveDate};

    /// Date format used in every persisted cache: "YYYY-MM-DD"
    pub const DATE_FORMAT: &str = "%Y-%m-%d";

    /// Format a NaiveDate as "YYYY-MM-DD"
    pub fn format_date(date: &NaiveDate) -> String {
        date.format(DATE_FORMAT).to_string()
    }

    /// Parse a date string in "YYYY-MM-DD" format
    pub fn parse_date(s: &str) -> Result<NaiveDate, DateError> {
        NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
            .map_err(|_| DateError(format!("expected YYYY-MM-DD, got {s:?}")))
    }

    /// Parse a month/day label as written by the archive site, e.g. "11月8日".
    pub fn parse_month_day_label(label: &str) -> Result<(u32, u32), DateError> {
        let bad = || DateError(format!("expected a 月/日 label, got {label:?}"));
        let (month, rest) = label.trim().split_once('月').ok_or_else(bad)?;
        let day = rest.strip_suffix('日').ok_or_else(bad)?;
        let month = month.trim().parse::<u32>().map_err(|_| bad())?;
        let day = day.trim().parse::<u32>().map_err(|_| bad())?;
        Ok((month, day))
    }

    /// Resolve a month/day pair to a full date relative to `today`.
    ///
    /// Observations are never in the future, so a month/day that would land
    /// after `today` in the current year belongs to the previous year
    /// (e.g. "12月30日" seen on Jan 2).
    pub fn infer_year(month: u32, day: u32, today: NaiveDate) -> Result<NaiveDate, DateError> {
        let invalid = || DateError(format!("invalid month/day {month}/{day}"));
        let candidate = NaiveDate::from_ymd_opt(today.year(), month, day);
        match candidate {
            Some(date) if date <= today => Ok(date),
            _ => NaiveDate::from_ymd_opt(today.year() - 1, month, day).ok_or_else(invalid),
        }
    }

    /// Inclusive window of `days` days ending at `today`.
    pub fn lookback_window(today: NaiveDate, days: u32) -> (NaiveDate, NaiveDate) {
        let span = i64::from(days.max(1)) - 1;
        (today - Duration::days(span), today)
    }

    /// Inclusive window of `days` days starting at `today`.
    pub fn horizon_window(today: NaiveDate, days: u32) -> (NaiveDate, NaiveDate) {
        let span = i64::from(days.max(1)) - 1;
        (today, today + Duration::days(span))
    }

    /// Every (year, month) pair touched by the inclusive range, ascending.
    pub fn months_spanned(start: NaiveDate, end: NaiveDate) -> Vec<(i32, u32)> {
        let mut months = Vec::new();
        let (mut year, mut month) = (start.year(), start.month());
        while (year, month) <= (end.year(), end.month()) {
            months.push((year, month));
            if month == 12 {
                year += 1;
                month = 1;
            } else {
                month += 1;
            }
        }
        months
    }

}

/// Error types
pub mod error {
    use std::path::PathBuf;
    use thiserror::Error;

    #[derive(Debug, Error, PartialEq)]
    #[error("Date error: {0}")]
    pub struct DateError(pub String);

    /// A persisted cache file could not be read, parsed or written.
    #[derive(Debug, Error)]
    pub enum CacheError {
        #[error("cache {path} could not be accessed: {source}")]
        Io {
            path: PathBuf,
            #[source]
            source: std::io::Error,
        },
        #[error("cache {path} is malformed: {source}")]
        Malformed {
            path: PathBuf,
            #[source]
            source: serde_json::Error,
        },
    }
}

/// JSON cache files shared between pipeline stages.
pub mod cache {
    use crate::error::CacheError;
    use chrono::Local;
    use serde::{de::DeserializeOwned, Serialize};
    use std::path::Path;

    /// Timestamp format written into cache headers.
    pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    /// Local wall-clock timestamp for cache headers.
    pub fn timestamp_now() -> String {
        Local::now().format(TIMESTAMP_FORMAT).to_string()
    }

    /// Read and deserialize a cache file.
    pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CacheError> {
        let body = std::fs::read_to_string(path).map_err(|source| CacheError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        parse_json(path, &body)
    }

    /// Deserialize a cache payload already in memory. `path` only labels errors.
    pub fn parse_json<T: DeserializeOwned>(path: &Path, body: &str) -> Result<T, CacheError> {
        serde_json::from_str(body).map_err(|source| CacheError::Malformed {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Serialize `value` as pretty JSON and write it to `path`.
    pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), CacheError> {
        let body = serde_json::to_string_pretty(value).map_err(|source| CacheError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, body).map_err(|source| CacheError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

}
