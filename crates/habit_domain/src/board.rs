use std::collections::BTreeMap;

use chrono::NaiveDate;
use habit_core::{reconcile_on_load, HabitRecord, HabitStatus, RecordId};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Time-of-day columns in display order. Any other column name sorts
/// after these, alphabetically.
pub const COLUMN_ORDER: [&str; 4] = ["morning", "afternoon", "evening", "whole day"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Board {
    pub date: NaiveDate,
    pub columns: Vec<BoardColumn>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BoardColumn {
    pub name: String,
    pub entries: Vec<BoardEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BoardEntry {
    pub id: RecordId,
    pub title: String,
    pub status: HabitStatus,
    pub current_streak: u32,
    pub total_completed: u32,
    pub counter: f64,
    pub next_due: Option<NaiveDate>,
    pub color: String,
}

impl Board {
    pub fn column(&self, name: &str) -> Option<&BoardColumn> {
        self.columns
            .iter()
            .find(|column| column.name.eq_ignore_ascii_case(name))
    }

    pub fn entries(&self) -> impl Iterator<Item = &BoardEntry> {
        self.columns.iter().flat_map(|column| column.entries.iter())
    }
}

/// Groups active habits into their columns as they stand on `today`.
/// Without `show_all`, habits that cannot be acted on today are left out.
pub fn build_board(records: &[HabitRecord], today: NaiveDate, show_all: bool) -> Board {
    let mut grouped: BTreeMap<(usize, String), Vec<(i64, BoardEntry)>> = BTreeMap::new();

    for record in records.iter().filter(|record| record.is_active()) {
        let habit = match record.to_habit() {
            Ok(habit) => reconcile_on_load(&habit, today),
            Err(err) => {
                warn!(id = %record.id, %err, "skipping unreadable habit");
                continue;
            }
        };
        let status = HabitStatus::of(&habit, today);
        if !show_all && status == HabitStatus::NotActionable {
            continue;
        }

        let name = record.column().trim().to_ascii_lowercase();
        let rank = COLUMN_ORDER
            .iter()
            .position(|known| known.eq_ignore_ascii_case(&name))
            .unwrap_or(COLUMN_ORDER.len());
        let entry = BoardEntry {
            id: record.id.clone(),
            title: record.title.clone(),
            status,
            current_streak: habit.current_streak,
            total_completed: habit.total_completed,
            counter: habit.counter,
            next_due: habit.next_due,
            color: record.color.clone().unwrap_or_default(),
        };
        grouped
            .entry((rank, name))
            .or_default()
            .push((record.column_index(), entry));
    }

    let columns = grouped
        .into_iter()
        .map(|((_, name), mut entries)| {
            entries.sort_by(|(a_index, a), (b_index, b)| {
                a_index.cmp(b_index).then_with(|| a.title.cmp(&b.title))
            });
            BoardColumn {
                name,
                entries: entries.into_iter().map(|(_, entry)| entry).collect(),
            }
        })
        .collect();

    Board {
        date: today,
        columns,
    }
}
