//! Calendar arithmetic for phase boundaries.
//!
//! Every boundary the workflow computes is routed through
//! [`Calendar::midnight`], so two sweeps that run at different times of the
//! same day arrive at the same dates.

pub mod clock;
pub mod interval;

pub use clock::{Clock, ManualClock, SystemClock};
pub use interval::Interval;

use crate::core::{DeletionError, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc};

/// Day arithmetic in a fixed local offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calendar {
    offset: FixedOffset,
}

impl Calendar {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    pub fn utc() -> Self {
        Self::new(Utc.fix())
    }

    /// Build from an offset in minutes east of UTC.
    pub fn from_offset_minutes(minutes: i32) -> Result<Self> {
        minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .map(Self::new)
            .ok_or_else(|| {
                DeletionError::InvalidConfig(format!("utc offset of {} minutes is out of range", minutes))
            })
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Add `by` to `at` using local calendar fields.
    pub fn shift(&self, at: DateTime<Utc>, by: Interval) -> Result<DateTime<Utc>> {
        let local = self.local(at);
        let shifted = by.apply(local).ok_or_else(|| {
            DeletionError::DateOutOfRange(format!("{} shifted by {}", at.to_rfc3339(), by))
        })?;
        self.resolve(shifted)
    }

    /// Local midnight of `reference + base_offset`.
    pub fn midnight(&self, base_offset: Interval, reference: DateTime<Utc>) -> Result<DateTime<Utc>> {
        let shifted = self.shift(reference, base_offset)?;
        let day = self.local(shifted).date();
        self.resolve(day.and_time(NaiveTime::MIN))
    }

    /// Local midnight of the day `at` falls on.
    pub fn start_of_day(&self, at: DateTime<Utc>) -> Result<DateTime<Utc>> {
        self.midnight(Interval::ZERO, at)
    }

    /// Local midnight at the start of `date`.
    pub fn date_start(&self, date: NaiveDate) -> Result<DateTime<Utc>> {
        self.resolve(date.and_time(NaiveTime::MIN))
    }

    /// Render the local calendar date of `at`, e.g. `2024-03-15`.
    pub fn format_date(&self, at: DateTime<Utc>) -> String {
        self.local(at).format("%Y-%m-%d").to_string()
    }

    fn local(&self, at: DateTime<Utc>) -> NaiveDateTime {
        at.with_timezone(&self.offset).naive_local()
    }

    fn resolve(&self, local: NaiveDateTime) -> Result<DateTime<Utc>> {
        self.offset
            .from_local_datetime(&local)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| DeletionError::DateOutOfRange(format!("local time {} is not representable", local)))
    }
}

impl Default for Calendar {
    fn default() -> Self {
        Self::utc()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(raw: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(raw).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_midnight_truncates_to_day() {
        let calendar = Calendar::utc();
        let morning = utc("2024-03-15T08:15:00Z");
        let evening = utc("2024-03-15T23:59:59Z");
        let expected = utc("2024-03-15T00:00:00Z");
        assert_eq!(calendar.midnight(Interval::ZERO, morning).unwrap(), expected);
        assert_eq!(calendar.midnight(Interval::ZERO, evening).unwrap(), expected);
    }

    #[test]
    fn test_midnight_with_offset_interval() {
        let calendar = Calendar::utc();
        let now = utc("2024-01-31T10:30:00Z");
        assert_eq!(
            calendar.midnight(Interval::months(1), now).unwrap(),
            utc("2024-02-29T00:00:00Z")
        );
        assert_eq!(
            calendar.midnight(Interval::weeks(-1), now).unwrap(),
            utc("2024-01-24T00:00:00Z")
        );
    }

    #[test]
    fn test_midnight_uses_local_day() {
        let calendar = Calendar::from_offset_minutes(120).unwrap();
        // 23:30 UTC is already the next day at +02:00.
        let now = utc("2024-03-15T23:30:00Z");
        assert_eq!(
            calendar.midnight(Interval::ZERO, now).unwrap(),
            utc("2024-03-15T22:00:00Z")
        );
        assert_eq!(calendar.format_date(now), "2024-03-16");
        assert_eq!(
            calendar
                .date_start(NaiveDate::from_ymd_opt(2024, 3, 16).unwrap())
                .unwrap(),
            utc("2024-03-15T22:00:00Z")
        );
    }

    #[test]
    fn test_shift_keeps_time_of_day() {
        let calendar = Calendar::utc();
        let at = utc("2024-03-15T08:15:00Z");
        assert_eq!(
            calendar.shift(at, Interval::days(-3)).unwrap(),
            utc("2024-03-12T08:15:00Z")
        );
    }

    #[test]
    fn test_offset_out_of_range() {
        assert!(Calendar::from_offset_minutes(24 * 60).is_err());
        assert!(Calendar::from_offset_minutes(-(24 * 60)).is_err());
        assert!(Calendar::from_offset_minutes(-300).is_ok());
    }
}
