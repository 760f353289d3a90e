//! Error types for the scheduling engine.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// User-triggered transitions that can be refused.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum HabitAction {
    Complete,
    Undo,
}

impl fmt::Display for HabitAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Complete => f.write_str("complete"),
            Self::Undo => f.write_str("undo"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HabitError {
    /// Malformed frequency configuration, rejected before any computation.
    #[error("invalid frequency policy: {0}")]
    InvalidPolicy(String),

    /// A date string that is not `YYYY-MM-DD`.
    #[error("invalid date format: `{0}`")]
    InvalidDateFormat(String),

    /// The requested transition does not apply on this date. Callers are
    /// expected to leave their state as it was.
    #[error("cannot {action} habit `{id}` on {date}")]
    NotActionable {
        id: String,
        action: HabitAction,
        date: NaiveDate,
    },
}

impl HabitError {
    pub fn is_not_actionable(&self) -> bool {
        matches!(self, Self::NotActionable { .. })
    }
}

pub type Result<T> = std::result::Result<T, HabitError>;
