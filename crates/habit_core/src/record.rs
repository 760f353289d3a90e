//! Store record shape.
//!
//! Records are the flat JSON objects kept in the habit store. Older
//! revisions wrote form values as strings and left fields out or null, so
//! deserialization is lenient and `migrate` fills defaults once, at the store
//! boundary. Engine code only ever sees the validated [`Habit`] produced by
//! [`HabitRecord::to_habit`].

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::{format_iso, parse_iso};
use crate::error::{HabitError, Result};
use crate::frequency::FrequencyPolicy;
use crate::habit::Habit;
use crate::schedule::due_date_on_creation;

pub const CURRENT_SCHEMA_VERSION: u32 = 1;
pub const DEFAULT_PROJECT: &str = "default";
pub const DEFAULT_COLUMN: &str = "whole day";
pub const DEFAULT_COLOR: &str = "default";
pub const DEFAULT_COLUMN_INDEX: i64 = 999;

/// Form input for an interval habit raises a missing or sub-one interval to
/// one day. Other frequency types keep the value as given.
pub fn normalize_intervalday(frequency_type: &str, intervalday: Option<i64>) -> Option<i64> {
    if frequency_type.trim().eq_ignore_ascii_case("interval") {
        Some(intervalday.unwrap_or(1).max(1))
    } else {
        intervalday
    }
}

/// Opaque record identity. Timestamps were used as numeric ids, newer
/// records may use strings; either is written back as it was read.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitRecord {
    pub id: RecordId,
    #[serde(default, deserialize_with = "lenient::text")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub frequency_type: String,
    #[serde(default, deserialize_with = "lenient::optional_int")]
    pub intervalday: Option<i64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub customdays: String,
    #[serde(default, deserialize_with = "lenient::number")]
    pub counter: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub incrementation: f64,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub last_completed: Option<String>,
    #[serde(default)]
    pub next_due: Option<String>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_active_today: bool,
    #[serde(default, deserialize_with = "lenient::count")]
    pub current_streak: u32,
    #[serde(default, deserialize_with = "lenient::count")]
    pub total_completed: u32,
    #[serde(default, deserialize_with = "lenient::list")]
    pub completion_history: Vec<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub created_date: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub notes: String,
    #[serde(default)]
    pub belongs: Option<String>,
    /// Legacy name of `belongs`, folded in by `migrate`.
    #[serde(default, skip_serializing)]
    pub priority: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_int")]
    pub column_index: Option<i64>,
    #[serde(default)]
    pub schema_version: u32,
}

/// Creation request from a habit form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewHabit {
    pub id: RecordId,
    pub title: String,
    pub frequency_type: String,
    pub intervalday: Option<i64>,
    pub customdays: String,
    pub counter: f64,
    pub incrementation: f64,
    pub start_date: Option<NaiveDate>,
    pub belongs: Option<String>,
    pub notes: String,
    pub color: Option<String>,
    pub project_id: Option<String>,
}

impl NewHabit {
    pub fn daily(id: impl Into<RecordId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            frequency_type: "daily".into(),
            intervalday: None,
            customdays: String::new(),
            counter: 0.0,
            incrementation: 0.0,
            start_date: None,
            belongs: None,
            notes: String::new(),
            color: None,
            project_id: None,
        }
    }
}

impl HabitRecord {
    /// Builds a fully migrated record and seeds `next_due` for its start
    /// date. An interval below one day is raised to one.
    pub fn create(new: NewHabit, today: NaiveDate) -> Result<Self> {
        let intervalday = normalize_intervalday(&new.frequency_type, new.intervalday);
        let policy = FrequencyPolicy::from_record(&new.frequency_type, intervalday, &new.customdays)?;
        let start = new.start_date.unwrap_or(today);
        let next_due = due_date_on_creation(&policy, start);

        let record = Self {
            id: new.id,
            title: new.title,
            frequency_type: policy.frequency_type().to_string(),
            intervalday: policy.intervalday().map(i64::from),
            customdays: policy.customdays(),
            counter: new.counter,
            incrementation: new.incrementation,
            project_id: new.project_id,
            last_completed: None,
            next_due: Some(format_iso(next_due)),
            is_active_today: false,
            current_streak: 0,
            total_completed: 0,
            completion_history: Vec::new(),
            is_active: Some(true),
            created_date: Some(format_iso(today)),
            notes: new.notes,
            belongs: new.belongs,
            priority: None,
            start_date: Some(format_iso(start)),
            color: new.color,
            column_index: None,
            schema_version: 0,
        };
        Ok(record.migrate(today))
    }

    /// Fills defaults left by older revisions. Idempotent.
    pub fn migrate(mut self, today: NaiveDate) -> Self {
        let created = filled(self.created_date.take()).unwrap_or_else(|| format_iso(today));
        self.start_date = filled(self.start_date.take()).or_else(|| Some(created.clone()));
        self.created_date = Some(created);
        self.project_id = filled(self.project_id.take()).or_else(|| Some(DEFAULT_PROJECT.into()));
        self.belongs = filled(self.belongs.take())
            .or_else(|| filled(self.priority.take()))
            .or_else(|| Some(DEFAULT_COLUMN.into()));
        self.priority = None;
        self.color = filled(self.color.take()).or_else(|| Some(DEFAULT_COLOR.into()));
        self.column_index = self.column_index.or(Some(DEFAULT_COLUMN_INDEX));
        self.is_active = self.is_active.or(Some(true));
        self.next_due = filled(self.next_due.take());
        self.last_completed = filled(self.last_completed.take());
        self.schema_version = CURRENT_SCHEMA_VERSION;
        self
    }

    pub fn is_active(&self) -> bool {
        self.is_active.unwrap_or(true)
    }

    pub fn column(&self) -> &str {
        self.belongs.as_deref().unwrap_or(DEFAULT_COLUMN)
    }

    pub fn column_index(&self) -> i64 {
        self.column_index.unwrap_or(DEFAULT_COLUMN_INDEX)
    }

    pub fn frequency(&self) -> Result<FrequencyPolicy> {
        FrequencyPolicy::from_record(&self.frequency_type, self.intervalday, &self.customdays)
    }

    /// Validated engine view of this record. History is normalised to
    /// ascending distinct dates.
    pub fn to_habit(&self) -> Result<Habit> {
        let frequency = self.frequency()?;
        let start = self
            .start_date
            .as_deref()
            .or(self.created_date.as_deref())
            .ok_or_else(|| HabitError::InvalidDateFormat(String::new()))?;

        let mut completion_history = self
            .completion_history
            .iter()
            .map(|entry| parse_iso(entry))
            .collect::<Result<Vec<_>>>()?;
        completion_history.sort_unstable();
        completion_history.dedup();

        Ok(Habit {
            id: self.id.to_string(),
            frequency,
            start_date: parse_iso(start)?,
            next_due: parse_optional(self.next_due.as_deref())?,
            completion_history,
            current_streak: self.current_streak,
            total_completed: self.total_completed,
            counter: self.counter,
            incrementation: self.incrementation,
            last_completed: parse_optional(self.last_completed.as_deref())?,
        })
    }

    /// Writes back the fields owned by the engine.
    pub fn apply_habit(&mut self, habit: &Habit) {
        self.next_due = habit.next_due.map(format_iso);
        self.current_streak = habit.current_streak;
        self.completion_history = habit
            .completion_history
            .iter()
            .copied()
            .map(format_iso)
            .collect();
        self.total_completed = habit.total_completed;
        self.counter = habit.counter;
        self.last_completed = habit.last_completed.map(format_iso);
    }
}

/// Decodes the store's JSON array. Blank input is an empty store.
pub fn decode_records(raw: &str) -> serde_json::Result<Vec<HabitRecord>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(raw)
}

pub fn encode_records(records: &[HabitRecord]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(records)
}

fn filled(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

fn parse_optional(value: Option<&str>) -> Result<Option<NaiveDate>> {
    match value {
        Some(text) if !text.trim().is_empty() => parse_iso(text).map(Some),
        _ => Ok(None),
    }
}

mod lenient {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn blank(value: &Value) -> bool {
        match value {
            Value::Null => true,
            Value::String(text) => text.trim().is_empty(),
            _ => false,
        }
    }

    fn as_f64(value: &Value) -> Option<f64> {
        match value {
            Value::Number(number) => number.as_f64(),
            Value::String(text) => text.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        let value = Value::deserialize(deserializer)?;
        if blank(&value) {
            return Ok(0.0);
        }
        as_f64(&value).ok_or_else(|| D::Error::custom(format!("expected a number, got {value}")))
    }

    pub fn optional_int<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<i64>, D::Error> {
        let value = Value::deserialize(deserializer)?;
        if blank(&value) {
            return Ok(None);
        }
        as_f64(&value)
            .filter(|number| number.fract() == 0.0)
            .map(|number| Some(number as i64))
            .ok_or_else(|| D::Error::custom(format!("expected an integer, got {value}")))
    }

    pub fn count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        match optional_int(deserializer)? {
            None => Ok(0),
            Some(number) => u32::try_from(number)
                .map_err(|_| D::Error::custom(format!("expected a non-negative count, got {number}"))),
        }
    }

    pub fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
    }

    pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
    }

    pub fn list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
    }
}
