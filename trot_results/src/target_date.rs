//! # Target Date
//!
//! Identifies the race day a run processes. Scheduled runs always look at
//! "yesterday": the invocation instant minus 24 hours, in the configured time
//! zone. That shifted instant also becomes the timestamp stamped on every
//! performance of the run.

use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, TimeZone};
use chrono_tz::Tz;

/// The race day of a run and the epoch timestamp recorded for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetDate {
    pub date: NaiveDate,
    pub timestamp_ms: i64,
}

impl TargetDate {
    /// The day before `now`, keeping `now`'s time of day in the timestamp.
    pub fn yesterday<Z: TimeZone>(now: DateTime<Z>) -> Self {
        let yesterday = now - Duration::days(1);
        Self {
            date: yesterday.date_naive(),
            timestamp_ms: yesterday.timestamp_millis(),
        }
    }

    /// An explicit race day, stamped with local midnight in `tz`.
    ///
    /// Falls back to UTC midnight if midnight does not exist locally.
    pub fn for_date(date: NaiveDate, tz: &Tz) -> Self {
        let midnight = date.and_time(chrono::NaiveTime::MIN);
        let timestamp_ms = tz
            .from_local_datetime(&midnight)
            .earliest()
            .map(|local| local.timestamp_millis())
            .unwrap_or_else(|| midnight.and_utc().timestamp_millis());
        Self { date, timestamp_ms }
    }

    /// The date as the upstream API expects it: `Y-M-D` without zero padding.
    pub fn api_segment(&self) -> String {
        use chrono::Datelike;
        format!("{}-{}-{}", self.date.year(), self.date.month(), self.date.day())
    }
}

impl fmt::Display for TargetDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.date.format("%Y-%m-%d"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn yesterday_shifts_by_exactly_one_day() {
        let now = Utc.with_ymd_and_hms(2024, 3, 6, 10, 30, 0).unwrap();
        let target = TargetDate::yesterday(now);
        assert_eq!(target.date, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert_eq!(target.timestamp_ms, now.timestamp_millis() - 86_400_000);
    }

    #[test]
    fn yesterday_uses_the_local_calendar_day() {
        let tz: Tz = "Europe/Helsinki".parse().unwrap();
        // 23:30 UTC on the 5th is already the 6th in Helsinki.
        let now = Utc.with_ymd_and_hms(2024, 3, 5, 23, 30, 0).unwrap().with_timezone(&tz);
        assert_eq!(
            TargetDate::yesterday(now).date,
            NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
        );
    }

    #[test]
    fn api_segment_is_not_zero_padded() {
        let target = TargetDate::for_date(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(), &Tz::UTC);
        assert_eq!(target.api_segment(), "2024-3-5");
        assert_eq!(target.to_string(), "2024-03-05");

        let target = TargetDate::for_date(NaiveDate::from_ymd_opt(2023, 11, 28).unwrap(), &Tz::UTC);
        assert_eq!(target.api_segment(), "2023-11-28");
    }

    #[test]
    fn explicit_date_is_local_midnight() {
        let tz: Tz = "Europe/Helsinki".parse().unwrap();
        let target = TargetDate::for_date(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(), &tz);
        // Helsinki is UTC+2 in January.
        let expected = Utc.with_ymd_and_hms(2024, 1, 14, 22, 0, 0).unwrap();
        assert_eq!(target.timestamp_ms, expected.timestamp_millis());
    }
}
