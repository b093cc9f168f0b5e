//! Access Control List: identities granted privileged commands.
//!
//! Entries are stored as `"{transport-tag}-{identity}"` strings so the same
//! identity on two transports is tracked independently. The full list is
//! rewritten after every mutation; a failed write is logged and the
//! in-memory list stays authoritative.

use std::sync::{Mutex, PoisonError};

use color_eyre::Result;
use tracing::{debug, warn};

use crate::models::Transport;
use crate::storage::{BlobStore, ACCESS_FILE};

#[derive(Debug)]
pub struct AccessControlList {
    entries: Mutex<Vec<String>>,
    store: BlobStore,
}

fn entry_key(transport: Transport, identity: &str) -> String {
    format!("{}-{}", transport.tag(), identity)
}

impl AccessControlList {
    /// Load the list from storage, creating an empty file on first run.
    pub fn load(store: BlobStore) -> Result<Self> {
        let mut entries: Vec<String> = store.load_or_init(ACCESS_FILE)?;
        let before = entries.len();
        let mut seen = std::collections::HashSet::new();
        entries.retain(|e| seen.insert(e.clone()));
        if entries.len() != before {
            warn!("Dropped {} duplicate access entries", before - entries.len());
        }
        debug!("Loaded {} access entries", entries.len());
        Ok(Self {
            entries: Mutex::new(entries),
            store,
        })
    }

    /// Grant access. Adding an existing entry changes nothing but still
    /// rewrites the file.
    pub fn add(&self, transport: Transport, identity: &str) {
        let key = entry_key(transport, identity);
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if !entries.contains(&key) {
            entries.push(key);
        }
        self.persist(&entries);
    }

    /// Revoke access. Removing a non-member is a no-op.
    pub fn remove(&self, transport: Transport, identity: &str) {
        let key = entry_key(transport, identity);
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.retain(|e| *e != key);
        self.persist(&entries);
    }

    pub fn check(&self, transport: Transport, identity: &str) -> bool {
        let key = entry_key(transport, identity);
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&key)
    }

    /// Snapshot of the raw entries.
    pub fn entries(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn persist(&self, entries: &[String]) {
        if let Err(e) = self.store.save(ACCESS_FILE, entries) {
            warn!("Failed to persist access list: {:#}", e);
        }
    }
}
