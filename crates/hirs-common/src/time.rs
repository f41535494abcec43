//! Calendar and time-interval utilities for monthly granules.
//!
//! Monthly stepping cannot use a fixed day offset: each step advances by the
//! length of the current month (28 to 31 days), so month lengths are computed
//! per iteration.

use std::fmt;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{HirsError, HirsResult};

/// Number of days in the given month of the given year.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    match (
        NaiveDate::from_ymd_opt(year, month, 1),
        NaiveDate::from_ymd_opt(next_year, next_month, 1),
    ) {
        (Some(first), Some(next)) => (next - first).num_days() as u32,
        _ => 0,
    }
}

/// The first day of the month containing `date`.
pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// The first day of the month following the one containing `date`.
pub fn first_of_next_month(date: NaiveDate) -> NaiveDate {
    let first = first_of_month(date);
    first + Duration::days(days_in_month(first.year(), first.month()) as i64)
}

/// The half-open interval `[first_of_month, first_of_next_month)` of a granule.
pub fn month_interval(granule: NaiveDate) -> TimeInterval {
    let start = first_of_month(granule);
    TimeInterval::half_open(
        start.and_time(NaiveTime::MIN),
        first_of_next_month(start).and_time(NaiveTime::MIN),
    )
}

/// An interval between two instants with explicit open/closed bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeInterval {
    pub left: NaiveDateTime,
    pub right: NaiveDateTime,
    #[serde(default)]
    pub left_open: bool,
    #[serde(default)]
    pub right_open: bool,
}

impl TimeInterval {
    pub fn new(
        left: NaiveDateTime,
        right: NaiveDateTime,
        left_open: bool,
        right_open: bool,
    ) -> HirsResult<Self> {
        if right < left {
            return Err(HirsError::InvalidInterval(format!(
                "right bound {} precedes left bound {}",
                right, left
            )));
        }
        Ok(Self {
            left,
            right,
            left_open,
            right_open,
        })
    }

    /// `[left, right]`
    pub fn closed(left: NaiveDateTime, right: NaiveDateTime) -> Self {
        Self {
            left,
            right,
            left_open: false,
            right_open: false,
        }
    }

    /// `[left, right)`
    pub fn half_open(left: NaiveDateTime, right: NaiveDateTime) -> Self {
        Self {
            left,
            right,
            left_open: false,
            right_open: true,
        }
    }

    /// Parse `START/END` into a half-open interval.
    ///
    /// Each side accepts a date (`2017-01-01`), a naive datetime
    /// (`2017-01-01T00:00:00`) or RFC 3339 (`2017-01-01T00:00:00Z`).
    pub fn parse(s: &str) -> HirsResult<Self> {
        let (start, end) = s.split_once('/').ok_or_else(|| {
            HirsError::InvalidInterval(format!("expected START/END, got '{}'", s))
        })?;
        let left = parse_datetime(start.trim())?;
        let right = parse_datetime(end.trim())?;
        Self::new(left, right, false, true)
    }

    pub fn contains(&self, dt: &NaiveDateTime) -> bool {
        let after_left = if self.left_open {
            dt > &self.left
        } else {
            dt >= &self.left
        };
        let before_right = if self.right_open {
            dt < &self.right
        } else {
            dt <= &self.right
        };
        after_left && before_right
    }

    pub fn is_empty(&self) -> bool {
        self.left == self.right && (self.left_open || self.right_open)
    }

    /// The last calendar day the interval reaches.
    ///
    /// An open right bound sitting exactly on midnight does not reach that day.
    pub fn last_day(&self) -> NaiveDate {
        if self.right_open && self.right.time() == NaiveTime::MIN {
            self.right.date().pred_opt().unwrap_or(self.right.date())
        } else {
            self.right.date()
        }
    }

    /// Every calendar day touched by the interval, in order.
    pub fn days(&self) -> Vec<NaiveDate> {
        if self.is_empty() {
            return Vec::new();
        }
        let last = self.last_day();
        let mut days = Vec::new();
        let mut day = self.left.date();
        while day <= last {
            days.push(day);
            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }
        days
    }

    /// The first day of every calendar month touched by the interval, in order.
    pub fn month_starts(&self) -> Vec<NaiveDate> {
        if self.is_empty() {
            return Vec::new();
        }
        let start = first_of_month(self.left.date());
        let end = first_of_month(self.last_day());

        let mut months = Vec::new();
        let mut date = start;
        while date <= end {
            months.push(date);
            date = date + Duration::days(days_in_month(date.year(), date.month()) as i64);
        }
        months
    }
}

impl fmt::Display for TimeInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{} -> {}{}",
            if self.left_open { "(" } else { "[" },
            self.left,
            self.right,
            if self.right_open { ")" } else { "]" }
        )
    }
}

/// Parse a date or datetime string, assuming UTC when no offset is given.
pub fn parse_datetime(s: &str) -> HirsResult<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc).naive_utc());
    }

    if let Ok(ndt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Ok(ndt);
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN));
    }

    Err(HirsError::InvalidTime(s.to_string()))
}
