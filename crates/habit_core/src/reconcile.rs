//! Habit state transitions: load, complete, undo and edit. Each takes a
//! snapshot plus an explicit `today` and returns a new snapshot; a refused
//! transition returns an error before anything is changed.

use chrono::NaiveDate;
use tracing::debug;

use crate::error::{HabitAction, HabitError, Result};
use crate::frequency::FrequencyPolicy;
use crate::habit::Habit;
use crate::schedule::{due_date_after_completion, due_date_on_creation, next_due_from_start};
use crate::streak::{
    gap_breaks_streak, is_completed_today, is_due_today, is_streak_broken, streak_length,
};

/// Passive recompute on load or refresh. Compare the result with the input
/// to decide whether it needs persisting.
pub fn reconcile_on_load(habit: &Habit, today: NaiveDate) -> Habit {
    let mut next = habit.clone();
    next.next_due = Some(next_due_from_start(habit, today));
    if !habit.is_started(today) {
        return next;
    }

    if is_streak_broken(habit, today) {
        if habit.current_streak != 0 {
            debug!(id = %habit.id, streak = habit.current_streak, %today, "streak broken");
        }
        next.current_streak = 0;
        if let FrequencyPolicy::CustomWeekdays { .. } = habit.frequency {
            next.next_due = Some(due_date_on_creation(&habit.frequency, today));
        }
    }
    next
}

/// Records a completion for `today`. Completing a habit that is already
/// completed today leaves it unchanged.
pub fn reconcile_on_complete(habit: &Habit, today: NaiveDate) -> Result<Habit> {
    if is_completed_today(habit, today) {
        return Ok(habit.clone());
    }
    let out_of_order = habit
        .completion_history
        .last()
        .is_some_and(|last| *last > today);
    if !is_due_today(habit, today) || out_of_order {
        return Err(not_actionable(habit, HabitAction::Complete, today));
    }

    let mut next = habit.clone();
    next.current_streak = if habit.current_streak == 0 {
        1
    } else {
        streak_length(&habit.completion_history, today, &habit.frequency)
    };
    next.completion_history.push(today);
    next.total_completed = habit.total_completed.saturating_add(1);
    next.counter = habit.counter + habit.incrementation;
    next.next_due = Some(due_date_after_completion(&habit.frequency, today));
    next.last_completed = Some(today);

    debug!(id = %habit.id, streak = next.current_streak, %today, "habit completed");
    Ok(next)
}

/// Reverses today's completion. The habit becomes due again immediately.
pub fn reconcile_on_undo(habit: &Habit, today: NaiveDate) -> Result<Habit> {
    if !is_completed_today(habit, today) {
        return Err(not_actionable(habit, HabitAction::Undo, today));
    }

    let mut next = habit.clone();
    next.completion_history.pop();
    let previous = next.completion_history.last().copied();

    next.current_streak = match (habit.current_streak, previous) {
        (1, Some(previous))
            if gap_breaks_streak(&habit.frequency, habit.start_date, previous, today) =>
        {
            0
        }
        (streak, _) => streak.saturating_sub(1),
    };
    next.total_completed = habit.total_completed.saturating_sub(1);
    next.counter = habit.counter - habit.incrementation;
    next.next_due = Some(today);
    next.last_completed = previous;

    debug!(id = %habit.id, streak = next.current_streak, %today, "completion undone");
    Ok(next)
}

/// Call after user changes to frequency or start date have been applied.
/// Streak and history are left alone.
pub fn reconcile_on_edit(habit: &Habit, today: NaiveDate) -> Habit {
    let mut next = habit.clone();
    next.next_due = Some(next_due_from_start(habit, today));
    next
}

fn not_actionable(habit: &Habit, action: HabitAction, date: NaiveDate) -> HabitError {
    HabitError::NotActionable {
        id: habit.id.clone(),
        action,
        date,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::habit::HabitStatus;
    use chrono::Weekday;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn daily(start: NaiveDate) -> Habit {
        let mut habit = Habit::new("daily", FrequencyPolicy::Daily, start);
        habit.next_due = Some(due_date_on_creation(&habit.frequency, start));
        habit
    }

    #[test]
    fn load_resets_broken_streak() {
        let mut habit = daily(date(2024, 12, 1));
        habit.completion_history = vec![date(2024, 12, 31), date(2025, 1, 1)];
        habit.last_completed = Some(date(2025, 1, 1));
        habit.current_streak = 5;

        let today = date(2025, 1, 5);
        assert!(is_streak_broken(&habit, today));
        let reconciled = reconcile_on_load(&habit, today);
        assert_eq!(reconciled.current_streak, 0);
        assert_eq!(reconciled.next_due, Some(today));
        assert_eq!(reconciled.completion_history, habit.completion_history);
    }

    #[test]
    fn load_before_start_keeps_streak() {
        let mut habit = daily(date(2025, 7, 1));
        habit.current_streak = 3;
        habit.last_completed = Some(date(2025, 1, 1));
        let reconciled = reconcile_on_load(&habit, date(2025, 6, 1));
        assert_eq!(reconciled.current_streak, 3);
        assert_eq!(reconciled.next_due, Some(date(2025, 7, 1)));
    }

    #[test]
    fn load_is_stable_when_nothing_changed() {
        let habit = daily(date(2025, 6, 1));
        let once = reconcile_on_load(&habit, date(2025, 6, 1));
        assert_eq!(once, habit);
        assert_eq!(reconcile_on_load(&once, date(2025, 6, 1)), once);
    }

    #[test]
    fn complete_updates_progress() {
        let mut habit = daily(date(2025, 6, 1));
        habit.counter = 10.0;
        habit.incrementation = 2.5;

        let done = reconcile_on_complete(&habit, date(2025, 6, 1)).unwrap();
        assert_eq!(done.completion_history, vec![date(2025, 6, 1)]);
        assert_eq!(done.total_completed, 1);
        assert_eq!(done.counter, 12.5);
        assert_eq!(done.current_streak, 1);
        assert_eq!(done.next_due, Some(date(2025, 6, 2)));
        assert_eq!(done.last_completed, Some(date(2025, 6, 1)));
        assert_eq!(HabitStatus::of(&done, date(2025, 6, 1)), HabitStatus::CompletedToday);

        // The input snapshot is untouched.
        assert!(habit.completion_history.is_empty());
    }

    #[test]
    fn complete_twice_is_idempotent() {
        let habit = daily(date(2025, 6, 1));
        let once = reconcile_on_complete(&habit, date(2025, 6, 1)).unwrap();
        let twice = reconcile_on_complete(&once, date(2025, 6, 1)).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn complete_refuses_when_not_due() {
        let policy = FrequencyPolicy::custom_weekdays([Weekday::Wed]).unwrap();
        let habit = Habit::new("wed", policy, date(2025, 6, 1));
        let thursday = date(2025, 6, 5);
        let err = reconcile_on_complete(&habit, thursday).unwrap_err();
        assert!(err.is_not_actionable());
        assert_eq!(
            err,
            HabitError::NotActionable {
                id: "wed".into(),
                action: HabitAction::Complete,
                date: thursday,
            }
        );
    }

    #[test]
    fn complete_refuses_dates_before_last_completion() {
        let mut habit = daily(date(2025, 6, 1));
        habit.completion_history = vec![date(2025, 6, 10)];
        habit.next_due = Some(date(2025, 6, 1));
        assert!(reconcile_on_complete(&habit, date(2025, 6, 5)).is_err());
    }

    #[test]
    fn undo_restores_progress() {
        let mut habit = daily(date(2025, 6, 1));
        habit.completion_history = vec![date(2025, 6, 1), date(2025, 6, 2)];
        habit.last_completed = Some(date(2025, 6, 2));
        habit.current_streak = 2;
        habit.total_completed = 2;
        habit.counter = 4.0;
        habit.incrementation = 2.0;
        habit.next_due = Some(date(2025, 6, 3));

        let today = date(2025, 6, 3);
        let done = reconcile_on_complete(&habit, today).unwrap();
        assert_eq!(done.current_streak, 3);

        let undone = reconcile_on_undo(&done, today).unwrap();
        assert_eq!(undone.completion_history, habit.completion_history);
        assert_eq!(undone.total_completed, habit.total_completed);
        assert_eq!(undone.counter, habit.counter);
        assert_eq!(undone.current_streak, 2);
        assert_eq!(undone.last_completed, Some(date(2025, 6, 2)));
        assert_eq!(undone.next_due, Some(today));
    }

    #[test]
    fn undo_refuses_when_not_completed_today() {
        let habit = daily(date(2025, 6, 1));
        let err = reconcile_on_undo(&habit, date(2025, 6, 1)).unwrap_err();
        assert!(matches!(
            err,
            HabitError::NotActionable {
                action: HabitAction::Undo,
                ..
            }
        ));
    }

    #[test]
    fn undo_of_first_completion_after_break_zeroes_streak() {
        let mut habit = daily(date(2025, 6, 1));
        habit.completion_history = vec![date(2025, 6, 1), date(2025, 6, 5)];
        habit.last_completed = Some(date(2025, 6, 5));
        habit.current_streak = 1;
        habit.total_completed = 0;

        let undone = reconcile_on_undo(&habit, date(2025, 6, 5)).unwrap();
        assert_eq!(undone.current_streak, 0);
        assert_eq!(undone.total_completed, 0);
        assert_eq!(undone.last_completed, Some(date(2025, 6, 1)));
    }

    #[test]
    fn huge_interval_saturates_instead_of_panicking() {
        let every_n_days = std::num::NonZeroU32::new(u32::MAX).unwrap();
        let habit = Habit::new(
            "rare",
            FrequencyPolicy::Interval { every_n_days },
            date(2025, 1, 1),
        );
        let today = date(2025, 1, 2);
        let reconciled = reconcile_on_load(&habit, today);
        assert_eq!(reconciled.next_due, Some(NaiveDate::MAX));

        let mut due = reconcile_on_load(&habit, date(2025, 1, 1));
        due = reconcile_on_complete(&due, date(2025, 1, 1)).unwrap();
        assert_eq!(due.next_due, Some(NaiveDate::MAX));
        assert!(!is_streak_broken(&due, today));
    }

    #[test]
    fn edit_recomputes_from_new_start() {
        let mut habit = daily(date(2025, 1, 1));
        habit.current_streak = 4;
        habit.frequency = FrequencyPolicy::interval(7).unwrap();
        habit.start_date = date(2025, 6, 2);

        let edited = reconcile_on_edit(&habit, date(2025, 6, 5));
        assert_eq!(edited.next_due, Some(date(2025, 6, 9)));
        assert_eq!(edited.current_streak, 4);
    }
}
