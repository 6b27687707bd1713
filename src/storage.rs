//! Durable key-value surface for task state
//!
//! The persistence layer only needs string values under a handful of keys.
//! [`FileStore`] keeps one file per key in the data directory:
//!
//! ```text
//! <data dir>/
//!   config.toml              # Optional configuration
//!   todoTasks                # JSON array of task records
//!   todoTasks.lock           # Advisory lock for the key above
//!   todoTaskIdCounter        # Next id, decimal (advisory)
//!   todoTaskIdCounter.lock
//! ```

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::lock::{self, DEFAULT_LOCK_TIMEOUT_MS};

/// String values under string keys
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && !key.contains(['/', '\\'])
        && !key.ends_with(".lock");
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidArgument(format!("invalid storage key: {key:?}")))
    }
}

/// One file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    lock_timeout_ms: u64,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
        }
    }

    pub fn with_lock_timeout(mut self, timeout_ms: u64) -> Self {
        self.lock_timeout_ms = timeout_ms;
        self
    }

    /// Path of the file backing `key`
    pub fn key_path(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key)?;
        if !self.dir.exists() {
            return Ok(None);
        }
        lock::read_locked_str(&path, self.lock_timeout_ms)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.key_path(key)?;
        lock::write_atomic_locked(&path, value.as_bytes(), self.lock_timeout_ms)
    }
}

/// In-memory store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<BTreeMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of `key`, bypassing the trait
    pub fn peek(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    /// Overwrite `key` directly, e.g. to plant corrupt data in a test
    pub fn insert(&self, key: &str, value: &str) {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        Ok(self.peek(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        self.insert(key, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn file_store_round_trips_values() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = FileStore::new(temp_dir.path().join("data"));

        assert_eq!(store.get("todoTasks").unwrap(), None);
        store.set("todoTasks", "[]").unwrap();
        store.set("todoTaskIdCounter", "1").unwrap();

        assert_eq!(store.get("todoTasks").unwrap().as_deref(), Some("[]"));
        assert_eq!(store.get("todoTaskIdCounter").unwrap().as_deref(), Some("1"));
        assert!(temp_dir.path().join("data").join("todoTasks").exists());
    }

    #[test]
    fn keys_cannot_escape_the_directory() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = FileStore::new(temp_dir.path());
        for key in ["", "../todoTasks", "a/b", ".hidden", "todoTasks.lock"] {
            assert!(
                matches!(store.set(key, "x"), Err(Error::InvalidArgument(_))),
                "{key:?} accepted"
            );
        }
    }

    #[test]
    fn memory_store_clones_share_entries() {
        let store = MemoryStore::new();
        let mut writer = store.clone();
        writer.set("todoTasks", "[]").unwrap();
        assert_eq!(store.peek("todoTasks").as_deref(), Some("[]"));
    }
}
