use std::fmt;
use std::num::NonZeroU32;

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::calendar::{scan_week, weekday_index};
use crate::error::{HabitError, Result};

/// Longest accepted interval, roughly a century.
pub const MAX_INTERVAL_DAYS: i64 = 36_500;

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Non-empty set of weekdays. Construction rejects an empty set, so a
/// forward scan over one week always finds a member.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    pub fn new(days: impl IntoIterator<Item = Weekday>) -> Result<Self> {
        let bits = days
            .into_iter()
            .fold(0u8, |bits, day| bits | 1 << weekday_index(day));
        if bits == 0 {
            return Err(HabitError::InvalidPolicy(
                "custom weekday habit needs at least one day".into(),
            ));
        }
        Ok(Self(bits))
    }

    /// Parses the comma-separated store form, e.g. `"monday, Friday"`.
    /// Empty segments are ignored; unknown names are rejected.
    pub fn parse(customdays: &str) -> Result<Self> {
        let mut days = Vec::new();
        for token in customdays.split(',') {
            let name = token.trim();
            if name.is_empty() {
                continue;
            }
            let day = name
                .parse::<Weekday>()
                .map_err(|_| HabitError::InvalidPolicy(format!("unknown weekday `{name}`")))?;
            days.push(day);
        }
        Self::new(days)
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & (1 << weekday_index(day)) != 0
    }

    /// Members in Monday-first order.
    pub fn iter(&self) -> impl Iterator<Item = Weekday> + '_ {
        WEEK.into_iter().filter(|day| self.contains(*day))
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// First member on or after `date`.
    pub fn next_on_or_after(&self, date: NaiveDate) -> NaiveDate {
        scan_week(date, |day| self.contains(day)).unwrap_or(date)
    }
}

impl fmt::Display for WeekdaySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(weekday_name).collect();
        f.write_str(&names.join(","))
    }
}

impl fmt::Debug for WeekdaySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl TryFrom<String> for WeekdaySet {
    type Error = HabitError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<WeekdaySet> for String {
    fn from(value: WeekdaySet) -> Self {
        value.to_string()
    }
}

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

/// Which calendar days a habit is expected on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FrequencyPolicy {
    Daily,
    Interval { every_n_days: NonZeroU32 },
    CustomWeekdays { valid_days: WeekdaySet },
}

impl FrequencyPolicy {
    pub fn interval(every_n_days: i64) -> Result<Self> {
        if every_n_days > MAX_INTERVAL_DAYS {
            return Err(HabitError::InvalidPolicy(format!(
                "interval must be at most {MAX_INTERVAL_DAYS} days, got {every_n_days}"
            )));
        }
        u32::try_from(every_n_days)
            .ok()
            .and_then(NonZeroU32::new)
            .map(|every_n_days| Self::Interval { every_n_days })
            .ok_or_else(|| {
                HabitError::InvalidPolicy(format!(
                    "interval must be at least one day, got {every_n_days}"
                ))
            })
    }

    pub fn custom_weekdays(days: impl IntoIterator<Item = Weekday>) -> Result<Self> {
        Ok(Self::CustomWeekdays {
            valid_days: WeekdaySet::new(days)?,
        })
    }

    /// Builds a policy from the loose store fields (`frequencyType`,
    /// `intervalday`, `customdays`).
    pub fn from_record(
        frequency_type: &str,
        intervalday: Option<i64>,
        customdays: &str,
    ) -> Result<Self> {
        match frequency_type.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "interval" => {
                let days = intervalday.ok_or_else(|| {
                    HabitError::InvalidPolicy("interval habit is missing `intervalday`".into())
                })?;
                Self::interval(days)
            }
            "custom_weekdays" => Ok(Self::CustomWeekdays {
                valid_days: WeekdaySet::parse(customdays)?,
            }),
            other => Err(HabitError::InvalidPolicy(format!(
                "unknown frequency type `{other}`"
            ))),
        }
    }

    pub fn frequency_type(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Interval { .. } => "interval",
            Self::CustomWeekdays { .. } => "custom_weekdays",
        }
    }

    pub fn intervalday(&self) -> Option<u32> {
        match self {
            Self::Interval { every_n_days } => Some(every_n_days.get()),
            _ => None,
        }
    }

    pub fn customdays(&self) -> String {
        match self {
            Self::CustomWeekdays { valid_days } => valid_days.to_string(),
            _ => String::new(),
        }
    }

    /// Nominal number of days between two consecutive occurrences, used
    /// by streak counting.
    pub fn expected_gap(&self) -> i64 {
        match self {
            Self::Interval { every_n_days } => i64::from(every_n_days.get()),
            Self::Daily | Self::CustomWeekdays { .. } => 1,
        }
    }
}
