use anyhow::Result;
use habit_core::HabitRecord;
use parking_lot::Mutex;

/// Backing storage for the record array. Implementations are expected to
/// replace the whole array atomically on `write`.
pub trait HabitStore: Send + Sync {
    fn read(&self) -> Result<Vec<HabitRecord>>;
    fn write(&self, records: &[HabitRecord]) -> Result<()>;
}

/// In-process store, for tests and for embedders that persist elsewhere.
/// Records and the write counter share one lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<(Vec<HabitRecord>, usize)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<HabitRecord>) -> Self {
        Self {
            state: Mutex::new((records, 0)),
        }
    }

    pub fn snapshot(&self) -> Vec<HabitRecord> {
        self.state.lock().0.clone()
    }

    /// Number of `write` calls so far.
    pub fn write_count(&self) -> usize {
        self.state.lock().1
    }
}

impl HabitStore for MemoryStore {
    fn read(&self) -> Result<Vec<HabitRecord>> {
        Ok(self.state.lock().0.clone())
    }

    fn write(&self, records: &[HabitRecord]) -> Result<()> {
        let mut state = self.state.lock();
        state.0 = records.to_vec();
        state.1 += 1;
        Ok(())
    }
}

impl<S: HabitStore + ?Sized> HabitStore for std::sync::Arc<S> {
    fn read(&self) -> Result<Vec<HabitRecord>> {
        (**self).read()
    }

    fn write(&self, records: &[HabitRecord]) -> Result<()> {
        (**self).write(records)
    }
}
