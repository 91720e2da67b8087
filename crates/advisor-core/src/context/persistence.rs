use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::constants::paths;
use crate::error::{AdvisorError, Result};

/// Durable, process-local key-value storage.
///
/// Calls are synchronous: a `set` has reached storage by the time it returns.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Stores each key as `<dir>/<key>.json`.
pub struct FileStore {
    base_dir: PathBuf,
}

impl FileStore {
    /// Create a store in the default data directory (`~/.local/share/advisor/`).
    pub fn new() -> Result<Self> {
        let base_dir = Self::default_dir()?;
        Self::with_dir(base_dir)
    }

    /// Create a store rooted at a custom directory (useful for testing).
    pub fn with_dir(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir).map_err(|e| {
            AdvisorError::Config(format!("Failed to create data directory: {}", e))
        })?;

        Ok(Self { base_dir })
    }

    pub fn default_dir() -> Result<PathBuf> {
        let data = dirs::data_dir()
            .ok_or_else(|| AdvisorError::Config("Could not determine data directory".to_string()))?;

        Ok(data.join(paths::DATA_DIR))
    }

    pub fn dir(&self) -> &PathBuf {
        &self.base_dir
    }

    fn key_path(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(AdvisorError::storage(key, "invalid key"));
        }
        Ok(self.base_dir.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key)?;
        if !path.exists() {
            return Ok(None);
        }

        fs::read_to_string(&path)
            .map(Some)
            .map_err(|e| AdvisorError::storage(key, format!("failed to read: {}", e)))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.key_path(key)?;

        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, value)
            .map_err(|e| AdvisorError::storage(key, format!("failed to write temporary file: {}", e)))?;

        fs::rename(&tmp_path, &path)
            .map_err(|e| AdvisorError::storage(key, format!("failed to rename file: {}", e)))?;

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.key_path(key)?;
        if path.exists() {
            fs::remove_file(&path)
                .map_err(|e| AdvisorError::storage(key, format!("failed to delete: {}", e)))?;
        }
        Ok(())
    }
}

/// In-memory store for tests and `--ephemeral` sessions.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| AdvisorError::storage("*", "memory store lock poisoned"))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries()?.remove(key);
        Ok(())
    }
}
