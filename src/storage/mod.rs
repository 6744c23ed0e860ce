//! Storage layer for tradejournal
//!
//! Everything the backup core persists goes through the `SlotStore` trait:
//! a flat namespace of named slots, each holding one serialized string.
//!
//! - `FileSlotStore`: one file per slot with atomic writes and an optional
//!   byte quota
//! - `MemoryStore`: in-process store with fault injection, used by tests

pub mod file_io;
pub mod file_store;
pub mod memory;

pub use file_store::FileSlotStore;
pub use memory::MemoryStore;

use crate::error::{JournalError, JournalResult};

/// A flat key-value store of named slots
///
/// Implementations must be safe to share between the caller and the
/// snapshot timer thread.
pub trait SlotStore: Send + Sync {
    /// Read a slot, `None` if it doesn't exist
    fn get(&self, slot: &str) -> JournalResult<Option<String>>;

    /// Create or overwrite a slot
    fn set(&self, slot: &str, value: &str) -> JournalResult<()>;

    /// Delete a slot; deleting a missing slot is not an error
    fn remove(&self, slot: &str) -> JournalResult<()>;

    /// All slot names, sorted
    fn keys(&self) -> JournalResult<Vec<String>>;

    /// Stored size of a slot in bytes
    fn size(&self, slot: &str) -> JournalResult<Option<u64>> {
        Ok(self.get(slot)?.map(|v| v.len() as u64))
    }

    /// Slot names starting with `prefix`, sorted
    fn keys_with_prefix(&self, prefix: &str) -> JournalResult<Vec<String>> {
        Ok(self
            .keys()?
            .into_iter()
            .filter(|k| k.starts_with(prefix))
            .collect())
    }
}

/// Check that a slot name can be stored by every backend
pub fn validate_slot_name(slot: &str) -> JournalResult<()> {
    if slot.is_empty() {
        return Err(JournalError::Validation("Slot name cannot be empty".into()));
    }
    if slot == "." || slot == ".." {
        return Err(JournalError::Validation(format!(
            "Slot name '{}' is reserved",
            slot
        )));
    }
    if slot.contains(['/', '\\', '\0']) {
        return Err(JournalError::Validation(format!(
            "Slot name '{}' contains a path separator",
            slot
        )));
    }
    Ok(())
}
