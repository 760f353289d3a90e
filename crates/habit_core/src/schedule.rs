//! Due-date calculation.
//!
//! Creation, completion and reconciliation each have their own entry point.
//! A freshly created habit is due on its reference day. A completed one is
//! not due again the same day. Reconciliation ignores the stored `next_due`
//! and derives it from `start_date` plus history.

use chrono::NaiveDate;

use crate::calendar::{add_days, day_difference};
use crate::frequency::FrequencyPolicy;
use crate::habit::Habit;
use crate::streak::is_completed_today;

/// Seeds `next_due` for a habit created (or starting) on `reference`.
pub fn due_date_on_creation(policy: &FrequencyPolicy, reference: NaiveDate) -> NaiveDate {
    match policy {
        FrequencyPolicy::Daily | FrequencyPolicy::Interval { .. } => reference,
        FrequencyPolicy::CustomWeekdays { valid_days } => valid_days.next_on_or_after(reference),
    }
}

/// Next due date once a completion has been recorded on `completed_on`.
/// The completion day itself is never returned.
pub fn due_date_after_completion(policy: &FrequencyPolicy, completed_on: NaiveDate) -> NaiveDate {
    match policy {
        FrequencyPolicy::Daily => add_days(completed_on, 1),
        FrequencyPolicy::Interval { every_n_days } => {
            add_days(completed_on, i64::from(every_n_days.get()))
        }
        FrequencyPolicy::CustomWeekdays { valid_days } => {
            valid_days.next_on_or_after(add_days(completed_on, 1))
        }
    }
}

/// Recomputes `next_due` for `today` from the habit's start date and
/// history, independent of whatever `next_due` currently holds.
pub fn next_due_from_start(habit: &Habit, today: NaiveDate) -> NaiveDate {
    if !habit.is_started(today) {
        return habit.start_date;
    }
    let completed_today = is_completed_today(habit, today);
    match &habit.frequency {
        FrequencyPolicy::Daily if completed_today => add_days(today, 1),
        FrequencyPolicy::Daily => today,
        FrequencyPolicy::Interval { every_n_days } => interval_pattern_due(
            habit.start_date,
            i64::from(every_n_days.get()),
            today,
            completed_today,
        ),
        FrequencyPolicy::CustomWeekdays { valid_days } => valid_days.next_on_or_after(today),
    }
}

/// Interval due dates always fall on `start + k * every`. On a pattern day
/// the habit is due that day unless already completed, in which case the
/// next pattern day follows.
pub(crate) fn interval_pattern_due(
    start: NaiveDate,
    every: i64,
    on: NaiveDate,
    completed_on_day: bool,
) -> NaiveDate {
    let since_start = day_difference(start, on);
    if since_start < 0 {
        return start;
    }
    if since_start % every == 0 {
        return if completed_on_day {
            add_days(on, every)
        } else {
            on
        };
    }
    let next_offset = (since_start / every + 1) * every;
    add_days(start, next_offset)
}
