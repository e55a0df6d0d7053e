//! Calendar range helpers for cost queries.
//!
//! Everything upstream takes ISO `YYYY-MM-DD` boundaries, so every route
//! reduces to one of the ranges computed here: a calendar month, a trailing
//! window ending today, or a one-month forecast horizon.

use chrono::{Datelike, Duration, Months, NaiveDate, Utc};

use crate::error::DateRangeError;

/// Length of the trailing window used by the per-resource cost routes.
pub const TRAILING_WINDOW_DAYS: i64 = 14;

/// A calendar date range with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    /// First day of the range.
    pub start: NaiveDate,
    /// Last day of the range.
    pub end: NaiveDate,
}

impl DateRange {
    /// Range start in the `YYYY-MM-DD` wire format.
    pub fn start_iso(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    /// Range end in the `YYYY-MM-DD` wire format.
    pub fn end_iso(&self) -> String {
        self.end.format("%Y-%m-%d").to_string()
    }
}

/// Today's date in UTC.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// The 1st of the given month.
pub fn first_day_of_month(year: i32, month: u32) -> Result<NaiveDate, DateRangeError> {
    check_month(month)?;
    NaiveDate::from_ymd_opt(year, month, 1).ok_or(DateRangeError::OutOfRange)
}

/// The day before the 1st of the next month. December rolls over to January
/// of the following year.
pub fn last_day_of_month(year: i32, month: u32) -> Result<NaiveDate, DateRangeError> {
    check_month(month)?;
    let next_first = if month == 12 {
        first_day_of_month(year + 1, 1)?
    } else {
        first_day_of_month(year, month + 1)?
    };
    next_first.pred_opt().ok_or(DateRangeError::OutOfRange)
}

/// First through last day of the given month.
pub fn month_range(year: i32, month: u32) -> Result<DateRange, DateRangeError> {
    Ok(DateRange {
        start: first_day_of_month(year, month)?,
        end: last_day_of_month(year, month)?,
    })
}

/// The month containing `today`.
pub fn current_month(today: NaiveDate) -> Result<DateRange, DateRangeError> {
    month_range(today.year(), today.month())
}

/// The month before the one containing `today`, rolling the year back
/// across January.
pub fn previous_month(today: NaiveDate) -> Result<DateRange, DateRangeError> {
    let shifted = today
        .checked_sub_months(Months::new(1))
        .ok_or(DateRangeError::OutOfRange)?;
    month_range(shifted.year(), shifted.month())
}

/// `today - days` through `today`.
pub fn trailing_window(today: NaiveDate, days: i64) -> Result<DateRange, DateRangeError> {
    let start = today
        .checked_sub_signed(Duration::days(days))
        .ok_or(DateRangeError::OutOfRange)?;
    Ok(DateRange { start, end: today })
}

/// `today` through one calendar month ahead.
pub fn forecast_horizon(today: NaiveDate) -> Result<DateRange, DateRangeError> {
    let end = today
        .checked_add_months(Months::new(1))
        .ok_or(DateRangeError::OutOfRange)?;
    Ok(DateRange { start: today, end })
}

fn check_month(month: u32) -> Result<(), DateRangeError> {
    if (1..=12).contains(&month) {
        Ok(())
    } else {
        Err(DateRangeError::InvalidMonth { month })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
    }

    #[test]
    fn first_day_is_always_the_first() {
        for month in 1..=12 {
            let first = first_day_of_month(2022, month).expect("valid month");
            assert_eq!(first.day(), 1);
            assert_eq!(first.month(), month);
            assert_eq!(first.year(), 2022);
        }
    }

    #[test]
    fn last_day_handles_february() {
        assert_eq!(last_day_of_month(2022, 2), Ok(date(2022, 2, 28)));
        assert_eq!(last_day_of_month(2024, 2), Ok(date(2024, 2, 29)));
    }

    #[test]
    fn december_rolls_over_to_next_year() {
        assert_eq!(last_day_of_month(2022, 12), Ok(date(2022, 12, 31)));
    }

    #[test]
    fn last_day_is_adjacent_to_next_first() {
        for year in [2021, 2022, 2024] {
            for month in 1..=12 {
                let last = last_day_of_month(year, month).expect("valid month");
                let (next_year, next_month) = if month == 12 {
                    (year + 1, 1)
                } else {
                    (year, month + 1)
                };
                let next_first = first_day_of_month(next_year, next_month).expect("valid month");
                assert_eq!(last + Duration::days(1), next_first);
                assert!(first_day_of_month(year, month).expect("valid month") <= last);
            }
        }
    }

    #[test]
    fn month_outside_domain_is_rejected() {
        assert_eq!(
            first_day_of_month(2022, 0),
            Err(DateRangeError::InvalidMonth { month: 0 })
        );
        assert_eq!(
            last_day_of_month(2022, 13),
            Err(DateRangeError::InvalidMonth { month: 13 })
        );
        assert_eq!(
            month_range(2022, 42),
            Err(DateRangeError::InvalidMonth { month: 42 })
        );
    }

    #[test]
    fn current_month_spans_today() {
        let range = current_month(date(2022, 7, 19)).expect("valid date");
        assert_eq!(range.start, date(2022, 7, 1));
        assert_eq!(range.end, date(2022, 7, 31));
    }

    #[test]
    fn previous_month_rolls_year_back_in_january() {
        let range = previous_month(date(2023, 1, 15)).expect("valid date");
        assert_eq!(range.start, date(2022, 12, 1));
        assert_eq!(range.end, date(2022, 12, 31));
    }

    #[test]
    fn trailing_window_is_exactly_fourteen_days() {
        let today = date(2022, 3, 10);
        let range = trailing_window(today, TRAILING_WINDOW_DAYS).expect("valid window");
        assert_eq!(range.end, today);
        assert_eq!(range.end - range.start, Duration::days(TRAILING_WINDOW_DAYS));
        assert_eq!(range.start, date(2022, 2, 24));
    }

    #[test]
    fn forecast_horizon_is_one_month_ahead() {
        let range = forecast_horizon(date(2022, 1, 31)).expect("valid date");
        assert_eq!(range.start, date(2022, 1, 31));
        assert_eq!(range.end, date(2022, 2, 28));
    }

    #[test]
    fn iso_formatting_pads_components() {
        let range = month_range(2022, 3).expect("valid month");
        assert_eq!(range.start_iso(), "2022-03-01");
        assert_eq!(range.end_iso(), "2022-03-31");
    }
}
