//! In-memory secret store for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::SecretStoreError;
use crate::traits::SecretStore;

/// In-memory secret store for testing.
///
/// Absent slots read as empty strings, like the real stores. Reads and
/// writes can be made to fail independently.
#[derive(Debug, Clone)]
pub struct InMemorySecrets {
    /// Stored secrets
    secrets: Arc<Mutex<HashMap<String, String>>>,
    /// Identity reported by `whoami`
    identity: Arc<Mutex<String>>,
    /// Whether reads should fail
    fail_reads: Arc<Mutex<bool>>,
    /// Whether writes should fail
    fail_writes: Arc<Mutex<bool>>,
    /// Number of successful writes
    writes: Arc<Mutex<usize>>,
}

impl InMemorySecrets {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            secrets: Arc::new(Mutex::new(HashMap::new())),
            identity: Arc::new(Mutex::new("test-identity".to_string())),
            fail_reads: Arc::new(Mutex::new(false)),
            fail_writes: Arc::new(Mutex::new(false)),
            writes: Arc::new(Mutex::new(0)),
        }
    }

    /// Set a slot synchronously without counting it as a write.
    pub fn insert(&self, name: &str, value: &str) {
        self.secrets
            .lock()
            .unwrap()
            .insert(name.to_string(), value.to_string());
    }

    /// Read a slot synchronously.
    pub fn get(&self, name: &str) -> Option<String> {
        self.secrets.lock().unwrap().get(name).cloned()
    }

    /// Configure the identity returned by `whoami` (empty = unauthenticated).
    pub fn set_identity(&self, identity: &str) {
        *self.identity.lock().unwrap() = identity.to_string();
    }

    /// Configure whether reads should fail.
    pub fn set_fail_reads(&self, should_fail: bool) {
        *self.fail_reads.lock().unwrap() = should_fail;
    }

    /// Configure whether writes should fail.
    pub fn set_fail_writes(&self, should_fail: bool) {
        *self.fail_writes.lock().unwrap() = should_fail;
    }

    /// Number of `save_secret` calls that succeeded.
    pub fn write_count(&self) -> usize {
        *self.writes.lock().unwrap()
    }
}

impl Default for InMemorySecrets {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SecretStore for InMemorySecrets {
    async fn get_secret(&self, name: &str) -> Result<String, SecretStoreError> {
        if *self.fail_reads.lock().unwrap() {
            return Err(SecretStoreError::ReadFailed {
                name: name.to_string(),
                message: "Mock read failure".to_string(),
            });
        }
        Ok(self.get(name).unwrap_or_default())
    }

    async fn save_secret(&self, name: &str, value: &str) -> Result<(), SecretStoreError> {
        if *self.fail_writes.lock().unwrap() {
            return Err(SecretStoreError::SaveFailed {
                name: name.to_string(),
                message: "Mock save failure".to_string(),
            });
        }
        self.insert(name, value);
        *self.writes.lock().unwrap() += 1;
        Ok(())
    }

    async fn whoami(&self) -> Result<String, SecretStoreError> {
        Ok(self.identity.lock().unwrap().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_absent_slot_reads_empty() {
        let store = InMemorySecrets::new();
        assert_eq!(store.get_secret("missing").await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_save_counts_writes() {
        let store = InMemorySecrets::new();
        store.insert("seeded", "x");
        assert_eq!(store.write_count(), 0);

        store.save_secret("a", "1").await.unwrap();
        assert_eq!(store.write_count(), 1);
        assert_eq!(store.get("a"), Some("1".to_string()));
    }

    #[tokio::test]
    async fn test_failure_toggles() {
        let store = InMemorySecrets::new();
        store.set_fail_writes(true);
        assert!(store.save_secret("a", "1").await.is_err());
        assert_eq!(store.write_count(), 0);

        store.set_fail_reads(true);
        assert!(matches!(
            store.get_secret("a").await,
            Err(SecretStoreError::ReadFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_whoami_default_and_override() {
        let store = InMemorySecrets::new();
        assert_eq!(store.whoami().await.unwrap(), "test-identity");
        store.set_identity("");
        assert_eq!(store.whoami().await.unwrap(), "");
    }
}
