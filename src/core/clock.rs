//! Clock abstraction used by the weekly rollover check.
//!
//! The rollover only needs today's date to derive an ISO (year, week) pair, so
//! the clock is injected instead of calling `Local::now()` directly. Tests use
//! [`FixedClock`] to pin the calendar week.

use chrono::{Datelike, Local, NaiveDate};

/// Source of the current real-world date.
pub trait Clock: Send + Sync {
    /// The current local calendar date.
    fn today(&self) -> NaiveDate;
}

/// Clock backed by the system's local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Clock that always returns the same date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Formats the ISO week of `date` as `"{iso_year}-W{iso_week}"`, e.g. `"2024-W5"`.
///
/// The ISO year differs from the calendar year around New Year, so
/// 2024-12-30 is `"2025-W1"`.
#[must_use]
pub fn iso_week_id(date: NaiveDate) -> String {
    let week = date.iso_week();
    format!("{}-W{}", week.year(), week.week())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_iso_week_id_mid_year() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert_eq!(iso_week_id(date), "2024-W5");
    }

    #[test]
    fn test_iso_week_id_uses_iso_year() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 30).unwrap();
        assert_eq!(iso_week_id(date), "2025-W1");

        let date = NaiveDate::from_ymd_opt(2021, 1, 3).unwrap();
        assert_eq!(iso_week_id(date), "2020-W53");
    }

    #[test]
    fn test_same_week_same_id() {
        let monday = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let sunday = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let next_monday = NaiveDate::from_ymd_opt(2024, 3, 11).unwrap();
        assert_eq!(iso_week_id(monday), iso_week_id(sunday));
        assert_ne!(iso_week_id(sunday), iso_week_id(next_monday));
    }

    #[test]
    fn test_fixed_clock() {
        let date = NaiveDate::from_ymd_opt(2024, 9, 2).unwrap();
        assert_eq!(FixedClock(date).today(), date);
    }
}
