use chrono::NaiveDate;

use crate::calendar::{add_days, day_difference, weekday_of};
use crate::frequency::FrequencyPolicy;
use crate::habit::Habit;
use crate::schedule::interval_pattern_due;

pub fn is_due_today(habit: &Habit, today: NaiveDate) -> bool {
    if !habit.is_started(today) {
        return false;
    }
    match &habit.frequency {
        FrequencyPolicy::CustomWeekdays { valid_days } => valid_days.contains(weekday_of(today)),
        _ => habit.next_due.map_or(true, |due| today >= due),
    }
}

pub fn is_completed_today(habit: &Habit, today: NaiveDate) -> bool {
    habit.completion_history.last() == Some(&today)
}

/// Whether a scheduled occurrence between the last completion and `today`
/// went unfulfilled.
pub fn is_streak_broken(habit: &Habit, today: NaiveDate) -> bool {
    if !habit.is_started(today) {
        return false;
    }
    match habit.last_completion() {
        Some(last) => gap_breaks_streak(&habit.frequency, habit.start_date, last, today),
        None => false,
    }
}

/// Break rule shared by load-time detection and undo reversal.
pub(crate) fn gap_breaks_streak(
    policy: &FrequencyPolicy,
    start: NaiveDate,
    last: NaiveDate,
    today: NaiveDate,
) -> bool {
    match policy {
        FrequencyPolicy::Daily => day_difference(last, today) > 1,
        FrequencyPolicy::Interval { every_n_days } => {
            today > interval_pattern_due(start, i64::from(every_n_days.get()), last, true)
        }
        FrequencyPolicy::CustomWeekdays { valid_days } => {
            let skipped = day_difference(last, today) - 1;
            (1..=skipped).any(|offset| valid_days.contains(weekday_of(add_days(last, offset))))
        }
    }
}

/// Length of the run of completions ending at `today`, counting `today` as
/// a completion. Consecutive entries stay in the run while their gap is at
/// most one day more than the policy's expected gap.
pub fn streak_length(history: &[NaiveDate], today: NaiveDate, policy: &FrequencyPolicy) -> u32 {
    let mut dates: Vec<NaiveDate> = history.iter().copied().chain([today]).collect();
    dates.sort_unstable();
    dates.dedup();

    let tolerance = policy.expected_gap() + 1;
    let run = dates
        .windows(2)
        .rev()
        .take_while(|pair| day_difference(pair[0], pair[1]) <= tolerance)
        .count();
    run as u32 + 1
}
