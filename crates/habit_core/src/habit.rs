use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::frequency::FrequencyPolicy;
use crate::streak;

/// Scheduling view of a single habit. Reconciliation never mutates a
/// `Habit` in place; every transition returns a new value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Habit {
    pub id: String,
    pub frequency: FrequencyPolicy,
    pub start_date: NaiveDate,
    pub next_due: Option<NaiveDate>,
    /// Ascending, each date at most once.
    pub completion_history: Vec<NaiveDate>,
    pub current_streak: u32,
    pub total_completed: u32,
    pub counter: f64,
    pub incrementation: f64,
    pub last_completed: Option<NaiveDate>,
}

impl Habit {
    pub fn new(id: impl Into<String>, frequency: FrequencyPolicy, start_date: NaiveDate) -> Self {
        Self {
            id: id.into(),
            frequency,
            start_date,
            next_due: None,
            completion_history: Vec::new(),
            current_streak: 0,
            total_completed: 0,
            counter: 0.0,
            incrementation: 0.0,
            last_completed: None,
        }
    }

    /// Most recent completion, falling back to the stored `last_completed`
    /// for records whose history was never written.
    pub fn last_completion(&self) -> Option<NaiveDate> {
        self.completion_history
            .last()
            .copied()
            .or(self.last_completed)
    }

    pub fn is_started(&self, today: NaiveDate) -> bool {
        today >= self.start_date
    }
}

/// What a presentation layer may offer for a habit on a given day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum HabitStatus {
    NotActionable,
    Actionable,
    CompletedToday,
}

impl HabitStatus {
    pub fn of(habit: &Habit, today: NaiveDate) -> Self {
        if streak::is_completed_today(habit, today) {
            Self::CompletedToday
        } else if streak::is_due_today(habit, today) {
            Self::Actionable
        } else {
            Self::NotActionable
        }
    }

    pub fn is_checked(&self) -> bool {
        matches!(self, Self::CompletedToday)
    }
}
