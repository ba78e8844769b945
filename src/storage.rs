use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::warn;

use crate::app_dirs::AppDirs;
use crate::error::{StorageError, StorageResult};

/// Epoch-millisecond start of the running session, present only while running
pub const TIMER_START_KEY: &str = "timerStartTime";
/// `"true"` / `"false"`
pub const TIMER_RUNNING_KEY: &str = "timerIsRunning";
/// JSON array of sessions, newest first
pub const HISTORY_KEY: &str = "timerHistory";

/// Local string key-value persistence that survives process restarts
pub trait KeyValueStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;
    fn remove(&self, key: &str) -> StorageResult<()>;
}

/// Key-value store persisted as a single JSON object file.
///
/// Every write reads the whole file, applies the change and replaces the
/// file through a temporary sibling plus rename. Clones address the same file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new() -> Self {
        let path = AppDirs::state_path().unwrap_or_else(|| PathBuf::from("stint_state.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> StorageResult<BTreeMap<String, String>> {
        match fs::read(&self.path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(BTreeMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Entries to start a write from. An unreadable document is replaced
    /// rather than leaving the store permanently unwritable.
    fn entries_for_write(&self) -> StorageResult<BTreeMap<String, String>> {
        match self.read_entries() {
            Err(StorageError::Serialization(e)) => {
                warn!(path = %self.path.display(), error = %e, "discarding corrupt state file");
                Ok(BTreeMap::new())
            }
            other => other,
        }
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let data = serde_json::to_vec_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, data)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl Default for FileStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.read_entries()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut entries = self.entries_for_write()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_entries(&entries)
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let mut entries = self.entries_for_write()?;
        if entries.remove(key).is_some() {
            self.write_entries(&entries)?;
        }
        Ok(())
    }
}

/// In-process store; clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.entries().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    #[test]
    fn file_store_roundtrip() {
        let dir = tempdir().unwrap();
        let store = FileStore::with_path(dir.path().join("nested").join("state.json"));
        assert_eq!(store.get(TIMER_RUNNING_KEY).unwrap(), None);

        store.set(TIMER_RUNNING_KEY, "true").unwrap();
        store.set(TIMER_START_KEY, "1234").unwrap();
        assert_eq!(store.get(TIMER_RUNNING_KEY).unwrap().as_deref(), Some("true"));

        store.remove(TIMER_START_KEY).unwrap();
        assert_eq!(store.get(TIMER_START_KEY).unwrap(), None);
        assert!(!store.path().with_extension("json.tmp").exists());
    }

    #[test]
    fn file_store_clones_see_each_others_writes() {
        let dir = tempdir().unwrap();
        let a = FileStore::with_path(dir.path().join("state.json"));
        let b = a.clone();
        a.set(HISTORY_KEY, "[]").unwrap();
        b.set(TIMER_RUNNING_KEY, "false").unwrap();
        assert_eq!(a.get(TIMER_RUNNING_KEY).unwrap().as_deref(), Some("false"));
        assert_eq!(b.get(HISTORY_KEY).unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn corrupt_file_reports_on_read_and_is_replaced_on_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, b"{ not json").unwrap();
        let store = FileStore::with_path(&path);

        assert_matches!(store.get(HISTORY_KEY), Err(StorageError::Serialization(_)));

        store.set(TIMER_RUNNING_KEY, "false").unwrap();
        assert_eq!(store.get(TIMER_RUNNING_KEY).unwrap().as_deref(), Some("false"));
    }

    #[test]
    fn unwritable_location_is_an_io_error() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"").unwrap();
        let store = FileStore::with_path(blocker.join("state.json"));
        assert_matches!(store.set(TIMER_RUNNING_KEY, "true"), Err(StorageError::Io(_)));
    }

    #[test]
    fn memory_store_clones_share_entries() {
        let store = MemoryStore::new();
        let other = store.clone();
        store.set("k", "v").unwrap();
        assert_eq!(other.get("k").unwrap().as_deref(), Some("v"));
        other.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }
}
