//! Nth-weekday-of-month arithmetic.
//!
//! Everything here is recomputed from the month of the date being asked
//! about; nothing is cached across month boundaries.

use chrono::{Datelike, NaiveDate, Weekday};

/// Number of days in `month` of `year`.
#[must_use]
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first_of_next| first_of_next.pred_opt())
        .map_or(0, |last| last.day())
}

/// Day-of-month of the first `weekday` in the month whose 1st falls on `first_of_month`.
///
/// `1 + ((weekday - first_weekday + 7) mod 7)`.
fn first_occurrence_day(first_of_month: Weekday, weekday: Weekday) -> u32 {
    let target = weekday.num_days_from_monday();
    let first = first_of_month.num_days_from_monday();
    1 + (target + 7 - first) % 7
}

/// Date of the `n`-th `weekday` of `month`, or `None` if that occurrence does
/// not exist (e.g. a 5th Saturday in a month with four).
#[must_use]
pub fn nth_weekday_of_month(year: i32, month: u32, weekday: Weekday, n: u32) -> Option<NaiveDate> {
    if n == 0 {
        return None;
    }
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let day = (n - 1)
        .checked_mul(7)
        .and_then(|offset| offset.checked_add(first_occurrence_day(first.weekday(), weekday)))?;
    if day > days_in_month(year, month) {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Returns true if `date` is the n-th `weekday` of its month for any `n` in
/// `occurrences`.
///
/// Occurrences that fall past the end of the month never match.
#[must_use]
pub fn is_nth_weekday_of_month(date: NaiveDate, weekday: Weekday, occurrences: &[u32]) -> bool {
    if date.weekday() != weekday {
        return false;
    }
    occurrences
        .iter()
        .filter_map(|&n| nth_weekday_of_month(date.year(), date.month(), weekday, n))
        .any(|occurrence| occurrence == date)
}
