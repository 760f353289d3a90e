use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use habit_core::{
    normalize_intervalday, reconcile_on_complete, reconcile_on_edit, reconcile_on_load, reconcile_on_undo, Habit,
    HabitAction, HabitError, HabitRecord, HabitStatus, NewHabit, RecordId,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::{
    board::{self, Board},
    config::TrackerConfig,
    store::{HabitStore, MemoryStore},
};

/// User-supplied changes to an existing habit. `None` leaves a field as it
/// is; frequency fields are validated together before anything is applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HabitEdit {
    pub title: Option<String>,
    pub frequency_type: Option<String>,
    pub intervalday: Option<i64>,
    pub customdays: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub belongs: Option<String>,
    pub color: Option<String>,
    pub counter: Option<f64>,
    pub incrementation: Option<f64>,
}

impl HabitEdit {
    fn apply(&self, record: &HabitRecord) -> Result<HabitRecord> {
        let mut next = record.clone();
        if let Some(frequency_type) = &self.frequency_type {
            next.frequency_type = frequency_type.clone();
        }
        if let Some(intervalday) = self.intervalday {
            next.intervalday = Some(intervalday);
        }
        if let Some(customdays) = &self.customdays {
            next.customdays = customdays.clone();
        }
        next.intervalday = normalize_intervalday(&next.frequency_type, next.intervalday);
        let policy = next.frequency()?;
        next.frequency_type = policy.frequency_type().to_string();
        next.intervalday = policy.intervalday().map(i64::from);
        next.customdays = policy.customdays();

        if let Some(start) = self.start_date {
            next.start_date = Some(habit_core::calendar::format_iso(start));
        }
        if let Some(title) = &self.title {
            next.title = title.clone();
        }
        if let Some(notes) = &self.notes {
            next.notes = notes.clone();
        }
        if let Some(belongs) = &self.belongs {
            next.belongs = Some(belongs.clone());
        }
        if let Some(color) = &self.color {
            next.color = Some(color.clone());
        }
        if let Some(counter) = self.counter {
            next.counter = counter;
        }
        if let Some(incrementation) = self.incrementation {
            next.incrementation = incrementation;
        }
        Ok(next)
    }
}

/// Owns the habit records for one store and runs every transition through
/// the reconciler before persisting.
pub struct HabitTracker {
    store: Box<dyn HabitStore>,
    config: TrackerConfig,
    records: RwLock<Vec<HabitRecord>>,
}

pub struct HabitTrackerBuilder {
    store: Option<Box<dyn HabitStore>>,
    config: TrackerConfig,
}

impl HabitTrackerBuilder {
    pub fn new() -> Self {
        Self {
            store: None,
            config: TrackerConfig::default(),
        }
    }

    pub fn with_store(mut self, store: impl HabitStore + 'static) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    pub fn with_config(mut self, config: TrackerConfig) -> Self {
        self.config = config;
        self
    }

    /// Loads and migrates every record, then reconciles them for the
    /// configured "today".
    pub fn build(self) -> Result<HabitTracker> {
        let store: Box<dyn HabitStore> = match self.store {
            Some(store) => store,
            None => Box::new(MemoryStore::new()),
        };
        let today = self.config.today();
        let loaded = store.read().context("reading habit store")?;
        let migrated: Vec<HabitRecord> = loaded
            .iter()
            .cloned()
            .map(|record| record.migrate(today))
            .collect();
        let needs_write = migrated != loaded;

        let tracker = HabitTracker {
            store,
            config: self.config,
            records: RwLock::new(migrated),
        };
        let changed = tracker.refresh(today)?;
        if needs_write && changed == 0 {
            let records = tracker.records.read();
            tracker.persist(&records)?;
        }
        Ok(tracker)
    }
}

impl Default for HabitTrackerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HabitTracker {
    pub fn builder() -> HabitTrackerBuilder {
        HabitTrackerBuilder::new()
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn today(&self) -> NaiveDate {
        self.config.today()
    }

    pub fn records(&self) -> Vec<HabitRecord> {
        self.records.read().clone()
    }

    pub fn record(&self, id: &RecordId) -> Option<HabitRecord> {
        self.records
            .read()
            .iter()
            .find(|record| &record.id == id)
            .cloned()
    }

    pub fn status(&self, id: &RecordId, today: NaiveDate) -> Result<HabitStatus> {
        let record = self.record(id).ok_or_else(|| missing(id))?;
        let habit = reconcile_on_load(&record.to_habit()?, today);
        Ok(HabitStatus::of(&habit, today))
    }

    /// Reconciles every active habit for `today` and persists when anything
    /// changed. Returns the number of records that changed.
    #[instrument(skip(self))]
    pub fn refresh(&self, today: NaiveDate) -> Result<usize> {
        let mut records = self.records.write();
        let mut changed = 0;
        for record in records.iter_mut().filter(|record| record.is_active()) {
            let habit = match record.to_habit() {
                Ok(habit) => habit,
                Err(err) => {
                    warn!(id = %record.id, %err, "skipping unreadable habit");
                    continue;
                }
            };
            let reconciled = reconcile_on_load(&habit, today);
            let active_today = HabitStatus::of(&reconciled, today) == HabitStatus::Actionable;
            if reconciled != habit || record.is_active_today != active_today {
                record.apply_habit(&reconciled);
                record.is_active_today = active_today;
                changed += 1;
            }
        }
        if changed > 0 {
            debug!(changed, "habits reconciled");
            self.persist(&records)?;
        }
        Ok(changed)
    }

    #[instrument(skip(self, new), fields(id = %new.id))]
    pub fn create(&self, new: NewHabit, today: NaiveDate) -> Result<HabitRecord> {
        let mut records = self.records.write();
        if records.iter().any(|record| record.id == new.id) {
            return Err(anyhow!("habit `{}` already exists", new.id));
        }
        let mut record = HabitRecord::create(new, today)?;
        let habit = record.to_habit()?;
        record.is_active_today = HabitStatus::of(&habit, today) == HabitStatus::Actionable;

        let mut next = records.clone();
        next.push(record.clone());
        self.persist(&next)?;
        *records = next;
        Ok(record)
    }

    #[instrument(skip(self))]
    pub fn complete(&self, id: &RecordId, today: NaiveDate) -> Result<HabitRecord> {
        self.transition(id, today, |habit| {
            reconcile_on_complete(&reconcile_on_load(habit, today), today)
        })
    }

    #[instrument(skip(self))]
    pub fn undo(&self, id: &RecordId, today: NaiveDate) -> Result<HabitRecord> {
        self.transition(id, today, |habit| reconcile_on_undo(habit, today))
    }

    /// Checkbox semantics: undo a completion made today, otherwise
    /// complete.
    #[instrument(skip(self))]
    pub fn toggle(&self, id: &RecordId, today: NaiveDate) -> Result<HabitRecord> {
        match self.status(id, today)? {
            HabitStatus::CompletedToday => self.undo(id, today),
            HabitStatus::Actionable => self.complete(id, today),
            HabitStatus::NotActionable => Err(HabitError::NotActionable {
                id: id.to_string(),
                action: HabitAction::Complete,
                date: today,
            }
            .into()),
        }
    }

    #[instrument(skip(self, edit))]
    pub fn edit(&self, id: &RecordId, edit: &HabitEdit, today: NaiveDate) -> Result<HabitRecord> {
        let mut records = self.records.write();
        let index = position(&records, id)?;
        let mut updated = edit
            .apply(&records[index])
            .with_context(|| format!("editing habit `{id}`"))?;
        let habit = reconcile_on_edit(&updated.to_habit()?, today);
        updated.apply_habit(&habit);
        updated.is_active_today = HabitStatus::of(&habit, today) == HabitStatus::Actionable;

        self.replace(&mut records, index, updated)
    }

    #[instrument(skip(self))]
    pub fn remove(&self, id: &RecordId) -> Result<bool> {
        let mut records = self.records.write();
        let Ok(index) = position(&records, id) else {
            return Ok(false);
        };
        let mut next = records.clone();
        next.remove(index);
        self.persist(&next)?;
        *records = next;
        Ok(true)
    }

    pub fn board(&self, today: NaiveDate) -> Board {
        board::build_board(&self.records.read(), today, self.config.show_all)
    }

    fn transition(
        &self,
        id: &RecordId,
        today: NaiveDate,
        step: impl FnOnce(&Habit) -> habit_core::Result<Habit>,
    ) -> Result<HabitRecord> {
        let mut records = self.records.write();
        let index = position(&records, id)?;
        let habit = records[index].to_habit()?;
        let next = step(&habit)?;

        let mut updated = records[index].clone();
        updated.apply_habit(&next);
        updated.is_active_today = HabitStatus::of(&next, today) == HabitStatus::Actionable;
        self.replace(&mut records, index, updated)
    }

    /// Persists the array with `updated` in place, and only then swaps it
    /// into memory.
    fn replace(
        &self,
        records: &mut Vec<HabitRecord>,
        index: usize,
        updated: HabitRecord,
    ) -> Result<HabitRecord> {
        let mut next = records.clone();
        next[index] = updated.clone();
        self.persist(&next)?;
        *records = next;
        Ok(updated)
    }

    fn persist(&self, records: &[HabitRecord]) -> Result<()> {
        self.store.write(records).map_err(|err| {
            warn!(%err, "failed to write habit store");
            err.context("writing habit store")
        })
    }
}

fn position(records: &[HabitRecord], id: &RecordId) -> Result<usize> {
    records
        .iter()
        .position(|record| &record.id == id)
        .ok_or_else(|| missing(id))
}

fn missing(id: &RecordId) -> anyhow::Error {
    anyhow!("habit `{id}` not found")
}
