//! Date-only calendar arithmetic. Every value here is a plain calendar day
//! with no time or timezone component.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::error::{HabitError, Result};

pub const ISO_FORMAT: &str = "%Y-%m-%d";

/// Whole days from `a` to `b`, i.e. `b - a`.
pub fn day_difference(a: NaiveDate, b: NaiveDate) -> i64 {
    b.signed_duration_since(a).num_days()
}

pub fn weekday_of(date: NaiveDate) -> Weekday {
    date.weekday()
}

/// Sunday = 0 through Saturday = 6.
pub fn weekday_index(weekday: Weekday) -> u8 {
    weekday.num_days_from_sunday() as u8
}

/// Saturates at the ends of the representable calendar.
pub fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    Duration::try_days(days)
        .and_then(|delta| date.checked_add_signed(delta))
        .unwrap_or(if days < 0 {
            NaiveDate::MIN
        } else {
            NaiveDate::MAX
        })
}

pub fn format_iso(date: NaiveDate) -> String {
    date.format(ISO_FORMAT).to_string()
}

pub fn parse_iso(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), ISO_FORMAT)
        .map_err(|_| HabitError::InvalidDateFormat(input.to_string()))
}

/// First day within the week starting at `from` whose weekday satisfies
/// `accept`. The search covers exactly seven days, so any predicate that
/// accepts at least one weekday always finds a match.
pub fn scan_week(from: NaiveDate, accept: impl Fn(Weekday) -> bool) -> Option<NaiveDate> {
    (0..7)
        .map(|offset| add_days(from, offset))
        .find(|date| accept(date.weekday()))
}
