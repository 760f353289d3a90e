pub mod calendar;
pub mod error;
pub mod frequency;
pub mod habit;
pub mod reconcile;
pub mod record;
pub mod schedule;
pub mod streak;

pub use crate::error::{HabitAction, HabitError, Result};
pub use crate::frequency::{FrequencyPolicy, WeekdaySet};
pub use crate::habit::{Habit, HabitStatus};
pub use crate::reconcile::{
    reconcile_on_complete, reconcile_on_edit, reconcile_on_load, reconcile_on_undo,
};
pub use crate::record::{normalize_intervalday, HabitRecord, NewHabit, RecordId};
