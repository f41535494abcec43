//! Common test fixtures for the HIRS CTP tests.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use hirs_common::{DailyContext, MonthlyContext, Satellite, TimeInterval, VersionSet};

/// Version identifiers used by the 2015 processing campaign.
pub fn versions() -> VersionSet {
    VersionSet::new("v20151014", "v20151014", "v20150915", "v20150915")
        .expect("fixture versions are valid")
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid fixture date")
}

pub fn midnight(year: i32, month: u32, day: u32) -> NaiveDateTime {
    date(year, month, day).and_time(NaiveTime::MIN)
}

/// `[first, last]` as a half-open day range ending the day after `last`.
pub fn days_interval(first: NaiveDate, last: NaiveDate) -> TimeInterval {
    let end = last.succ_opt().expect("valid fixture date");
    TimeInterval::half_open(first.and_time(NaiveTime::MIN), end.and_time(NaiveTime::MIN))
}

pub fn monthly_context(satellite: Satellite, year: i32, month: u32) -> MonthlyContext {
    MonthlyContext::new(date(year, month, 1), satellite, versions())
}

/// Every daily context of a month.
pub fn daily_contexts(satellite: Satellite, year: i32, month: u32) -> Vec<DailyContext> {
    hirs_common::month_interval(date(year, month, 1))
        .days()
        .into_iter()
        .map(|day| DailyContext::new(day, satellite, versions()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_daily_contexts_cover_month() {
        assert_eq!(daily_contexts(Satellite::MetopB, 2017, 1).len(), 31);
        assert_eq!(daily_contexts(Satellite::MetopB, 2016, 2).len(), 29);
    }

    #[test]
    fn test_days_interval_is_inclusive_of_last_day() {
        let interval = days_interval(date(2017, 6, 1), date(2017, 6, 3));
        assert_eq!(interval.days().len(), 3);
    }
}
