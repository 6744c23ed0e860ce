//! In-memory slot store
//!
//! Behaves like `FileSlotStore` (including the quota) and can be told to
//! reject upcoming writes to a slot, which is how tests reproduce a full
//! browser storage quota.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use super::{validate_slot_name, SlotStore};
use crate::error::{JournalError, JournalResult};

#[derive(Debug, Default)]
struct MemoryInner {
    slots: BTreeMap<String, String>,
    quota_bytes: Option<u64>,
    failing_writes: HashMap<String, usize>,
    write_attempts: HashMap<String, usize>,
}

/// Slot store held entirely in memory. Thread-safe via Mutex.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit the total stored bytes across all slots
    pub fn with_quota(self, quota_bytes: u64) -> Self {
        self.lock().quota_bytes = Some(quota_bytes);
        self
    }

    /// Reject the next `count` writes to `slot`
    pub fn fail_next_writes(&self, slot: &str, count: usize) {
        self.lock().failing_writes.insert(slot.to_string(), count);
    }

    /// Number of writes attempted on `slot`, including rejected ones
    pub fn write_attempts(&self, slot: &str) -> usize {
        self.lock().write_attempts.get(slot).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.lock().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().slots.is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SlotStore for MemoryStore {
    fn get(&self, slot: &str) -> JournalResult<Option<String>> {
        Ok(self.lock().slots.get(slot).cloned())
    }

    fn set(&self, slot: &str, value: &str) -> JournalResult<()> {
        validate_slot_name(slot)?;
        let mut inner = self.lock();

        *inner.write_attempts.entry(slot.to_string()).or_insert(0) += 1;

        if let Some(remaining) = inner.failing_writes.get_mut(slot) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(JournalError::QuotaExceeded {
                    slot: slot.to_string(),
                    needed: value.len() as u64,
                    limit: inner.quota_bytes.unwrap_or(0),
                });
            }
        }

        if let Some(limit) = inner.quota_bytes {
            let used: u64 = inner
                .slots
                .iter()
                .filter(|(k, _)| k.as_str() != slot)
                .map(|(_, v)| v.len() as u64)
                .sum();
            let needed = used + value.len() as u64;
            if needed > limit {
                return Err(JournalError::QuotaExceeded {
                    slot: slot.to_string(),
                    needed,
                    limit,
                });
            }
        }

        inner.slots.insert(slot.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, slot: &str) -> JournalResult<()> {
        self.lock().slots.remove(slot);
        Ok(())
    }

    fn keys(&self) -> JournalResult<Vec<String>> {
        Ok(self.lock().slots.keys().cloned().collect())
    }
}
