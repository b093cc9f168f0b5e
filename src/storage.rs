//! Named JSON blobs in the data directory.
//!
//! Each store (access list, counters) owns one file and rewrites it in full
//! on every mutation. Writes are synchronous; callers hold their own lock.

use color_eyre::{eyre::WrapErr, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Access list file name.
pub const ACCESS_FILE: &str = "access.json";

/// Counter map file name.
pub const COUNTERS_FILE: &str = "counters.json";

#[derive(Debug, Clone)]
pub struct BlobStore {
    dir: PathBuf,
}

impl BlobStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the blob called `name`.
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Create the data directory if needed.
    pub fn ensure_dir(&self) -> Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)
                .wrap_err_with(|| format!("Failed to create data directory {:?}", self.dir))?;
        }
        Ok(())
    }

    /// Load a blob, or `None` if it was never written.
    pub fn load<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        let file_path = self.path(name);
        if !file_path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&file_path)
            .wrap_err_with(|| format!("Failed to read {:?}", file_path))?;
        let value = serde_json::from_str(&json)
            .wrap_err_with(|| format!("Failed to deserialize {:?}", file_path))?;
        Ok(Some(value))
    }

    /// Load a blob, writing `T::default()` first when it does not exist.
    pub fn load_or_init<T>(&self, name: &str) -> Result<T>
    where
        T: DeserializeOwned + Serialize + Default,
    {
        match self.load(name)? {
            Some(value) => Ok(value),
            None => {
                let value = T::default();
                self.save(name, &value)?;
                Ok(value)
            }
        }
    }

    /// Rewrite a blob in full.
    pub fn save<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<()> {
        self.ensure_dir()?;
        let file_path = self.path(name);
        let json = serde_json::to_string_pretty(value)
            .wrap_err_with(|| format!("Failed to serialize {}", name))?;
        fs::write(&file_path, json)
            .wrap_err_with(|| format!("Failed to write {:?}", file_path))?;
        Ok(())
    }
}
