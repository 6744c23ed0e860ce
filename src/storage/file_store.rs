//! Directory-backed slot store
//!
//! Each slot is stored as `<dir>/<slot>.json`. Writes go through
//! `write_atomic`, so a crash mid-write leaves the previous value intact.

use std::fs;
use std::path::PathBuf;

use super::file_io::{read_optional, write_atomic};
use super::{validate_slot_name, SlotStore};
use crate::config::paths::JournalPaths;
use crate::config::settings::StorageSettings;
use crate::error::{JournalError, JournalResult};

const SLOT_EXTENSION: &str = ".json";

/// Slot store keeping one file per slot
#[derive(Debug, Clone)]
pub struct FileSlotStore {
    dir: PathBuf,
    quota_bytes: Option<u64>,
}

impl FileSlotStore {
    /// Create a store rooted at `dir` with no quota
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            quota_bytes: None,
        }
    }

    /// Open the store under the configured slots directory
    pub fn open(paths: &JournalPaths, settings: &StorageSettings) -> JournalResult<Self> {
        let dir = paths.slots_dir();
        fs::create_dir_all(&dir)
            .map_err(|e| JournalError::Io(format!("Failed to create slots directory: {}", e)))?;
        Ok(Self::new(dir).with_quota(settings.quota_bytes))
    }

    /// Limit the total stored bytes across all slots
    pub fn with_quota(mut self, quota_bytes: Option<u64>) -> Self {
        self.quota_bytes = quota_bytes;
        self
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    /// Total bytes currently stored
    pub fn usage_bytes(&self) -> JournalResult<u64> {
        let mut total = 0;
        for slot in self.keys()? {
            total += self.size(&slot)?.unwrap_or(0);
        }
        Ok(total)
    }

    fn slot_path(&self, slot: &str) -> JournalResult<PathBuf> {
        validate_slot_name(slot)?;
        Ok(self.dir.join(format!("{}{}", slot, SLOT_EXTENSION)))
    }

    fn check_quota(&self, slot: &str, value: &str) -> JournalResult<()> {
        let Some(limit) = self.quota_bytes else {
            return Ok(());
        };

        let current = self.usage_bytes()?;
        let replaced = self.size(slot)?.unwrap_or(0);
        let needed = current - replaced.min(current) + value.len() as u64;

        if needed > limit {
            return Err(JournalError::QuotaExceeded {
                slot: slot.to_string(),
                needed,
                limit,
            });
        }
        Ok(())
    }
}

impl SlotStore for FileSlotStore {
    fn get(&self, slot: &str) -> JournalResult<Option<String>> {
        read_optional(self.slot_path(slot)?)
    }

    fn set(&self, slot: &str, value: &str) -> JournalResult<()> {
        let path = self.slot_path(slot)?;
        self.check_quota(slot, value)?;
        write_atomic(path, value)
    }

    fn remove(&self, slot: &str) -> JournalResult<()> {
        let path = self.slot_path(slot)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(JournalError::Storage(format!(
                "Failed to remove {}: {}",
                path.display(),
                e
            ))),
        }
    }

    fn keys(&self) -> JournalResult<Vec<String>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(|e| {
            JournalError::Storage(format!("Failed to read slots directory: {}", e))
        })? {
            let entry = entry.map_err(|e| {
                JournalError::Storage(format!("Failed to read directory entry: {}", e))
            })?;

            if !entry.path().is_file() {
                continue;
            }

            // Temp files end in `.tmp` and never match
            let name = entry.file_name().to_string_lossy().to_string();
            if let Some(slot) = name.strip_suffix(SLOT_EXTENSION) {
                if !slot.is_empty() {
                    keys.push(slot.to_string());
                }
            }
        }

        keys.sort();
        Ok(keys)
    }

    fn size(&self, slot: &str) -> JournalResult<Option<u64>> {
        let path = self.slot_path(slot)?;
        match fs::metadata(&path) {
            Ok(metadata) => Ok(Some(metadata.len())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(JournalError::Storage(format!(
                "Failed to stat {}: {}",
                path.display(),
                e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use tempfile::TempDir;

    fn create_test_store() -> (FileSlotStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSlotStore::new(temp_dir.path().join("slots"));
        (store, temp_dir)
    }

    #[test]
    fn test_set_get_remove() {
        let (store, _temp) = create_test_store();

        assert!(store.get("j1").unwrap().is_none());

        store.set("j1", r#"{"a":1}"#).unwrap();
        assert_eq!(store.get("j1").unwrap().as_deref(), Some(r#"{"a":1}"#));
        assert!(store.dir().join("j1.json").exists());

        store.remove("j1").unwrap();
        assert!(store.get("j1").unwrap().is_none());

        // Removing again is fine
        store.remove("j1").unwrap();
    }

    #[test]
    fn test_keys_sorted_and_skip_temp_files() {
        let (store, _temp) = create_test_store();

        store.set("b", "2").unwrap();
        store.set("a", "1").unwrap();
        fs::write(store.dir().join("c.json.tmp"), "partial").unwrap();
        fs::write(store.dir().join("notes.txt"), "ignored").unwrap();

        assert_eq!(store.keys().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_keys_missing_dir() {
        let (store, _temp) = create_test_store();
        assert!(store.keys().unwrap().is_empty());
    }

    #[test]
    fn test_invalid_slot_rejected() {
        let (store, _temp) = create_test_store();
        let err = store.set("../escape", "x").unwrap_err();
        assert!(matches!(err, JournalError::Validation(_)));
    }

    #[test]
    fn test_quota_exceeded() {
        let (store, _temp) = create_test_store();
        let store = store.with_quota(Some(10));

        store.set("a", "12345").unwrap();
        // Overwriting counts only the new size
        store.set("a", "1234567890").unwrap();

        let err = store.set("b", "1").unwrap_err();
        assert!(err.is_quota_exceeded());
        assert!(store.get("b").unwrap().is_none());
        assert_eq!(store.usage_bytes().unwrap(), 10);
    }

    #[test]
    fn test_concurrent_writers_to_one_slot() {
        let (store, _temp) = create_test_store();
        let store = Arc::new(store);
        let large = "x".repeat(200_000);
        let small = "y".repeat(1_000);

        let handles: Vec<_> = [large.clone(), small.clone()]
            .into_iter()
            .map(|value| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    (0..200)
                        .filter(|_| store.set("latestFullBackup", &value).is_err())
                        .count()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 0);
        }

        let stored = store.get("latestFullBackup").unwrap().unwrap();
        assert!(stored == large || stored == small);
        assert_eq!(store.keys().unwrap(), vec!["latestFullBackup"]);
        // No temp files left behind
        assert_eq!(fs::read_dir(store.dir()).unwrap().count(), 1);
    }
}
