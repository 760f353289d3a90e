use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, Utc};
use habit_core::calendar::parse_iso;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum ClockMode {
    #[default]
    Local,
    Utc,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackerConfig {
    pub clock: ClockMode,
    /// Pins "today", mostly for demos and tests.
    pub today_override: Option<NaiveDate>,
    /// List habits that are not actionable today as well.
    pub show_all: bool,
}

impl TrackerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(clock) = lookup("HABIT_CLOCK") {
            match clock.trim().to_ascii_lowercase().as_str() {
                "utc" => config.clock = ClockMode::Utc,
                "local" | "" => config.clock = ClockMode::Local,
                other => tracing::warn!(value = other, "ignoring unknown HABIT_CLOCK"),
            }
        }
        if let Some(today) = lookup("HABIT_TODAY") {
            if !today.trim().is_empty() {
                let pinned = parse_iso(&today).context("HABIT_TODAY must be YYYY-MM-DD")?;
                info!(%pinned, "pinning today");
                config.today_override = Some(pinned);
            }
        }
        if let Some(show_all) = lookup("HABIT_SHOW_ALL") {
            config.show_all = matches!(
                show_all.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }
        Ok(config)
    }

    pub fn today(&self) -> NaiveDate {
        if let Some(today) = self.today_override {
            return today;
        }
        match self.clock {
            ClockMode::Local => Local::now().date_naive(),
            ClockMode::Utc => Utc::now().date_naive(),
        }
    }
}
