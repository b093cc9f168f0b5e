//! File-based secret store adapter.
//!
//! Secrets are kept as a flat JSON object of slot name to value. Used for
//! local runs when no vault URL is configured.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::SecretStoreError;
use crate::traits::SecretStore;

/// File name used inside the data directory.
pub const SECRETS_FILE: &str = "secrets.json";

#[derive(Debug)]
pub struct FileSecretStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles on the file.
    lock: Mutex<()>,
}

impl FileSecretStore {
    /// Store backed by `<data_dir>/secrets.json`.
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(SECRETS_FILE))
    }

    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<BTreeMap<String, String>, SecretStoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) if contents.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(contents) => serde_json::from_str(&contents)
                .map_err(|e| SecretStoreError::Serialization(e.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(SecretStoreError::Unavailable(format!(
                "{}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}

#[async_trait]
impl SecretStore for FileSecretStore {
    async fn get_secret(&self, name: &str) -> Result<String, SecretStoreError> {
        let _guard = self.lock.lock().await;
        let secrets = self.read_all().await?;
        Ok(secrets.get(name).cloned().unwrap_or_default())
    }

    async fn save_secret(&self, name: &str, value: &str) -> Result<(), SecretStoreError> {
        let _guard = self.lock.lock().await;
        let mut secrets = self.read_all().await?;
        secrets.insert(name.to_string(), value.to_string());

        let save_failed = |message: String| SecretStoreError::SaveFailed {
            name: name.to_string(),
            message,
        };

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| save_failed(e.to_string()))?;
        }
        let json = serde_json::to_string_pretty(&secrets)
            .map_err(|e| SecretStoreError::Serialization(e.to_string()))?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| save_failed(e.to_string()))?;

        debug!("Saved secret '{}' to {}", name, self.path.display());
        Ok(())
    }

    async fn whoami(&self) -> Result<String, SecretStoreError> {
        Ok(format!("file:{}", self.path.display()))
    }
}
