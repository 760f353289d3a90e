use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use habit_core::{
    record::{decode_records, encode_records},
    HabitError, HabitRecord, HabitStatus, RecordId,
};
use habit_domain::{HabitStore, HabitTracker, MemoryStore, TrackerConfig};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

const STORE_JSON: &str = r#"[
  {
    "id": 1748736000000,
    "title": "Drink water",
    "frequencyType": "daily",
    "intervalday": null,
    "customdays": "",
    "counter": "0",
    "incrementation": "2",
    "startDate": "2025-06-01",
    "nextDue": "2025-06-01",
    "completionHistory": [],
    "currentStreak": 0,
    "totalCompleted": 0,
    "priority": "morning"
  },
  {
    "id": "gym",
    "title": "Gym",
    "frequencyType": "custom_weekdays",
    "customdays": "monday,friday",
    "startDate": "2025-06-01",
    "belongs": "evening",
    "columnIndex": 0
  },
  {
    "id": "plants",
    "title": "Water plants",
    "frequencyType": "interval",
    "intervalday": "3",
    "startDate": "2025-06-01"
  }
]"#;

fn tracker(today: NaiveDate, show_all: bool) -> (HabitTracker, Arc<MemoryStore>) {
    let records = decode_records(STORE_JSON).expect("fixture decodes");
    let store = Arc::new(MemoryStore::with_records(records));
    let config = TrackerConfig {
        today_override: Some(today),
        show_all,
        ..TrackerConfig::default()
    };
    let tracker = HabitTracker::builder()
        .with_store(store.clone())
        .with_config(config)
        .build()
        .expect("build tracker");
    (tracker, store)
}

#[test]
fn week_of_habits_round_trip() {
    let water = RecordId::from(1748736000000);
    let day1 = date(2025, 6, 1);
    let (tracker, store) = tracker(day1, false);
    assert_eq!(tracker.today(), day1);

    // Sunday: water and plants are due, the gym is not.
    let board = tracker.board(day1);
    let titles: Vec<&str> = board.entries().map(|entry| entry.title.as_str()).collect();
    assert_eq!(titles, ["Drink water", "Water plants"]);
    assert_eq!(board.columns[0].name, "morning");

    let done = tracker.complete(&water, day1).expect("complete day 1");
    assert_eq!(done.current_streak, 1);
    assert_eq!(done.counter, 2.0);
    assert_eq!(done.next_due.as_deref(), Some("2025-06-02"));

    let day2 = date(2025, 6, 2);
    tracker.refresh(day2).expect("refresh day 2");
    let done = tracker.complete(&water, day2).expect("complete day 2");
    assert_eq!(done.current_streak, 2);
    assert_eq!(tracker.status(&RecordId::from("gym"), day2).unwrap(), HabitStatus::Actionable);

    // Day 3 skipped entirely.
    let day4 = date(2025, 6, 4);
    assert!(tracker.refresh(day4).expect("refresh day 4") > 0);
    let water_now = tracker.record(&water).unwrap();
    assert_eq!(water_now.current_streak, 0);
    assert!(water_now.is_active_today);

    let done = tracker.complete(&water, day4).expect("complete day 4");
    assert_eq!(done.current_streak, 1);
    assert_eq!(done.total_completed, 3);
    assert_eq!(done.counter, 6.0);

    // Undo and redo on the same day are symmetric.
    let undone = tracker.undo(&water, day4).expect("undo day 4");
    assert_eq!(undone.total_completed, 2);
    assert_eq!(undone.counter, 4.0);
    assert_eq!(undone.completion_history.len(), 2);
    tracker.complete(&water, day4).expect("redo day 4");

    // The persisted array is the tracker's view and keeps the store shape.
    let persisted = store.snapshot();
    assert_eq!(persisted, tracker.records());
    let encoded = encode_records(&persisted).unwrap();
    assert!(encoded.contains("\"completionHistory\""));
    assert!(encoded.contains("1748736000000"));
    assert!(!encoded.contains("priority"));
}

#[test]
fn show_all_lists_unactionable_habits() {
    let today = date(2025, 6, 1);
    let (tracker, _) = tracker(today, true);
    let board = tracker.board(today);
    let gym = board
        .entries()
        .find(|entry| entry.title == "Gym")
        .expect("gym listed");
    assert_eq!(gym.status, HabitStatus::NotActionable);
    assert_eq!(gym.next_due, Some(date(2025, 6, 2)));
}

#[test]
fn interval_habit_follows_start_pattern() {
    let plants = RecordId::from("plants");
    let (tracker, _) = tracker(date(2025, 6, 1), false);

    // Pattern day 06-01 missed: nothing is due until 06-04.
    let skipped = date(2025, 6, 2);
    tracker.refresh(skipped).unwrap();
    assert_eq!(tracker.status(&plants, skipped).unwrap(), HabitStatus::NotActionable);
    let err = tracker.complete(&plants, skipped).unwrap_err();
    assert!(err
        .downcast_ref::<HabitError>()
        .is_some_and(HabitError::is_not_actionable));
    assert_eq!(
        tracker.record(&plants).unwrap().next_due.as_deref(),
        Some("2025-06-04")
    );

    let due = date(2025, 6, 4);
    tracker.refresh(due).unwrap();
    let done = tracker.complete(&plants, due).unwrap();
    assert_eq!(done.current_streak, 1);
    assert_eq!(done.next_due.as_deref(), Some("2025-06-07"));

    tracker.refresh(date(2025, 6, 5)).unwrap();
    let record = tracker.record(&plants).unwrap();
    assert_eq!(record.next_due.as_deref(), Some("2025-06-07"));
    assert_eq!(record.current_streak, 1);

    tracker.refresh(date(2025, 6, 8)).unwrap();
    assert_eq!(tracker.record(&plants).unwrap().current_streak, 0);
}

struct ReadOnlyStore(Vec<HabitRecord>);

impl HabitStore for ReadOnlyStore {
    fn read(&self) -> Result<Vec<HabitRecord>> {
        Ok(self.0.clone())
    }

    fn write(&self, _records: &[HabitRecord]) -> Result<()> {
        Err(anyhow!("store is read-only"))
    }
}

#[test]
fn failed_write_keeps_memory_unchanged() {
    let today = date(2025, 6, 1);
    let records: Vec<HabitRecord> = decode_records(STORE_JSON)
        .unwrap()
        .into_iter()
        .map(|record| record.migrate(today))
        .collect();
    let store = Arc::new(MemoryStore::with_records(records));
    let seeded = HabitTracker::builder()
        .with_store(store.clone())
        .with_config(TrackerConfig {
            today_override: Some(today),
            ..TrackerConfig::default()
        })
        .build()
        .unwrap();
    let current = seeded.records();

    let tracker = HabitTracker::builder()
        .with_store(ReadOnlyStore(current.clone()))
        .with_config(seeded.config().clone())
        .build()
        .expect("nothing to write on build");

    let water = RecordId::from(1748736000000);
    let err = tracker.complete(&water, today).unwrap_err();
    assert!(err.downcast_ref::<HabitError>().is_none());
    assert!(err.to_string().contains("writing habit store"));
    assert_eq!(tracker.records(), current);
}
