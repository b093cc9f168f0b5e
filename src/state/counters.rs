//! Named integer counters, persisted as a JSON map.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use color_eyre::Result;
use tracing::{debug, warn};

use crate::storage::{BlobStore, COUNTERS_FILE};

#[derive(Debug)]
pub struct CounterStore {
    counters: Mutex<BTreeMap<String, i64>>,
    store: BlobStore,
}

impl CounterStore {
    /// Load the map from storage, creating an empty file on first run.
    pub fn load(store: BlobStore) -> Result<Self> {
        let counters: BTreeMap<String, i64> = store.load_or_init(COUNTERS_FILE)?;
        debug!("Loaded {} counters", counters.len());
        Ok(Self {
            counters: Mutex::new(counters),
            store,
        })
    }

    /// Add `delta` to `name` (created at 0) and return the new value.
    ///
    /// A delta of 0 is a read that still registers the counter. Values
    /// saturate at the `i64` bounds.
    pub fn apply(&self, name: &str, delta: i64) -> i64 {
        let mut counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        let value = counters.entry(name.to_string()).or_insert(0);
        *value = value.saturating_add(delta);
        let result = *value;

        if let Err(e) = self.store.save(COUNTERS_FILE, &*counters) {
            warn!("Failed to persist counters: {:#}", e);
        }
        result
    }

    pub fn exists(&self, name: &str) -> bool {
        self.counters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Current value without registering the counter.
    pub fn get(&self, name: &str) -> Option<i64> {
        self.counters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .copied()
    }

    pub fn snapshot(&self) -> BTreeMap<String, i64> {
        self.counters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn counters() -> (TempDir, CounterStore) {
        let dir = TempDir::new().unwrap();
        let store = CounterStore::load(BlobStore::new(dir.path())).unwrap();
        (dir, store)
    }

    #[test]
    fn test_apply_sums_deltas() {
        let (_dir, store) = counters();
        let deltas = [5, -2, 0, 10, -20];
        let mut last = 0;
        for d in deltas {
            last = store.apply("deaths", d);
        }
        assert_eq!(last, deltas.iter().sum::<i64>());
    }

    #[test]
    fn test_zero_delta_registers_counter() {
        let (_dir, store) = counters();
        assert!(!store.exists("hype"));
        assert_eq!(store.apply("hype", 0), 0);
        assert!(store.exists("hype"));
    }

    #[test]
    fn test_get_does_not_register() {
        let (_dir, store) = counters();
        assert_eq!(store.get("hype"), None);
        assert!(!store.exists("hype"));
    }

    #[test]
    fn test_apply_saturates() {
        let (_dir, store) = counters();
        store.apply("big", i64::MAX);
        assert_eq!(store.apply("big", 1), i64::MAX);
    }

    #[test]
    fn test_reload_reproduces_map() {
        let dir = TempDir::new().unwrap();
        let store = CounterStore::load(BlobStore::new(dir.path())).unwrap();
        store.apply("a", 3);
        store.apply("b", -7);

        let reloaded = CounterStore::load(BlobStore::new(dir.path())).unwrap();
        assert_eq!(reloaded.snapshot(), store.snapshot());
    }
}
