// src/month_calendar.rs
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Slots allocated per employee regardless of the month length.
pub const MAX_DAYS: usize = 31;

/// Work days run from 06:00 to 06:00 the next morning.
pub const WORK_DAY_START_HOUR: u32 = 6;

pub const WEEKDAY_ABBREVIATIONS: [&str; 7] = ["Pn", "Wt", "Śr", "Cz", "Pt", "So", "Nd"];

const SATURDAY: u32 = 5;
const SUNDAY: u32 = 6;

// --- Month Context ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthContext {
    pub year: i32,
    pub month: u32,
    pub days_in_month: u32,
    /// Weekday of day 1, Monday = 0 .. Sunday = 6.
    pub first_weekday_offset: u32,
}

/// Computes the month length and the weekday offset of its first day.
pub fn compute_month_context(year: i32, month: u32) -> Result<MonthContext> {
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or(AppError::InvalidMonth(month))?;
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let next_first =
        NaiveDate::from_ymd_opt(next_year, next_month, 1).ok_or(AppError::InvalidMonth(month))?;
    let days_in_month = (next_first - first).num_days() as u32;

    // chrono numbers Sunday as 0 here, remap so Monday is 0
    let native = first.weekday().num_days_from_sunday();
    let first_weekday_offset = if native == 0 { 6 } else { native - 1 };

    Ok(MonthContext {
        year,
        month,
        days_in_month,
        first_weekday_offset,
    })
}

impl MonthContext {
    pub fn active_days(&self) -> usize {
        self.days_in_month as usize
    }

    pub fn contains_day(&self, day: u32) -> bool {
        (1..=self.days_in_month).contains(&day)
    }

    /// Monday = 0 .. Sunday = 6 for a 1-based day of this month.
    pub fn weekday_of(&self, day: u32) -> u32 {
        (self.first_weekday_offset + day.saturating_sub(1)) % 7
    }

    pub fn is_weekend(&self, day: u32) -> bool {
        matches!(self.weekday_of(day), SATURDAY | SUNDAY)
    }

    pub fn weekday_abbreviation(&self, day: u32) -> &'static str {
        WEEKDAY_ABBREVIATIONS[self.weekday_of(day) as usize]
    }
}

// --- Work Day Clock ---

/// Day of month of the shift running at `now`; before 06:00 that is the
/// previous calendar day.
pub fn current_work_day(now: NaiveDateTime) -> u32 {
    if now.hour() < WORK_DAY_START_HOUR {
        (now - Duration::days(1)).day()
    } else {
        now.day()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(date_time: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(date_time, "%Y-%m-%d %H:%M:%S")
            .unwrap_or_else(|_| panic!("Invalid datetime string format: {}", date_time))
    }

    #[test]
    fn october_2025_starts_on_wednesday() {
        let ctx = compute_month_context(2025, 10).unwrap();
        assert_eq!(ctx.days_in_month, 31);
        assert_eq!(ctx.first_weekday_offset, 2);
    }

    #[test]
    fn sunday_start_maps_to_six() {
        // 2025-06-01 is a Sunday
        let ctx = compute_month_context(2025, 6).unwrap();
        assert_eq!(ctx.first_weekday_offset, 6);
        assert_eq!(ctx.days_in_month, 30);
    }

    #[test]
    fn monday_start_maps_to_zero() {
        // 2025-09-01 is a Monday
        let ctx = compute_month_context(2025, 9).unwrap();
        assert_eq!(ctx.first_weekday_offset, 0);
    }

    #[test]
    fn february_respects_leap_years() {
        assert_eq!(compute_month_context(2024, 2).unwrap().days_in_month, 29);
        assert_eq!(compute_month_context(2025, 2).unwrap().days_in_month, 28);
        assert_eq!(compute_month_context(2000, 2).unwrap().days_in_month, 29);
        assert_eq!(compute_month_context(1900, 2).unwrap().days_in_month, 28);
    }

    #[test]
    fn december_rolls_into_next_year() {
        let ctx = compute_month_context(2025, 12).unwrap();
        assert_eq!(ctx.days_in_month, 31);
    }

    #[test]
    fn invalid_month_is_rejected() {
        assert!(matches!(
            compute_month_context(2025, 0),
            Err(AppError::InvalidMonth(0))
        ));
        assert!(matches!(
            compute_month_context(2025, 13),
            Err(AppError::InvalidMonth(13))
        ));
    }

    #[test]
    fn weekend_detection() {
        let ctx = compute_month_context(2025, 10).unwrap();
        assert!(!ctx.is_weekend(1)); // Wednesday
        assert!(ctx.is_weekend(4)); // Saturday
        assert!(ctx.is_weekend(5)); // Sunday
        assert!(!ctx.is_weekend(6));
        assert_eq!(ctx.weekday_abbreviation(1), "Śr");
        assert_eq!(ctx.weekday_abbreviation(5), "Nd");
    }

    #[test]
    fn contains_day_bounds() {
        let ctx = compute_month_context(2025, 11).unwrap();
        assert!(ctx.contains_day(1));
        assert!(ctx.contains_day(30));
        assert!(!ctx.contains_day(31));
        assert!(!ctx.contains_day(0));
    }

    #[test]
    fn work_day_before_six_is_previous_day() {
        assert_eq!(current_work_day(at("2025-10-15 05:59:59")), 14);
        assert_eq!(current_work_day(at("2025-10-15 06:00:00")), 15);
        assert_eq!(current_work_day(at("2025-10-15 23:30:00")), 15);
    }

    #[test]
    fn work_day_before_six_on_first_wraps_to_previous_month() {
        assert_eq!(current_work_day(at("2025-11-01 03:00:00")), 31);
        assert_eq!(current_work_day(at("2025-03-01 00:10:00")), 28);
    }
}
