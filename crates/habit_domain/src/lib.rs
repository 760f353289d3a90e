pub mod board;
pub mod config;
pub mod service;
pub mod store;

pub use crate::config::TrackerConfig;
pub use crate::service::{HabitEdit, HabitTracker, HabitTrackerBuilder};
pub use crate::store::{HabitStore, MemoryStore};
