//! Key-value backends for small persisted preferences

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// String-to-string persistent storage.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

/// A flat JSON object on disk.
///
/// Every call reads the file; writes go to a sibling temp file that is then
/// renamed over the original.
#[derive(Debug)]
pub struct FileKvStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process
    write_lock: Mutex<()>,
}

impl FileKvStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(entries)?;
        let temp_path = self.path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&temp_path)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }

    fn update(&self, f: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut entries = match self.read_all() {
            Ok(entries) => entries,
            Err(Error::Json(e)) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Preferences file is unreadable, starting from empty"
                );
                BTreeMap::new()
            }
            Err(e) => return Err(e),
        };
        f(&mut entries);
        self.write_all(&entries)
    }
}

impl KvStore for FileKvStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })?;
        tracing::debug!(key, path = %self.path.display(), "Preference written");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.update(|entries| {
            entries.remove(key);
        })?;
        tracing::debug!(key, path = %self.path.display(), "Preference removed");
        Ok(())
    }
}

/// Process-local backend for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KvStore for MemoryKvStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries().remove(key);
        Ok(())
    }
}
