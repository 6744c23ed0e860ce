//! Per-key backup store
//!
//! Every backup of a key writes its primary backup slot and one new
//! timestamped slot, then prunes the timestamped slots down to the retention
//! count. Recovery reads the primary slot first and falls back to the
//! timestamped slots, newest first.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use super::record::{primary_backup_slot, timestamped_epoch, timestamped_prefix, timestamped_slot, SnapshotRecord};
use crate::clock::Clock;
use crate::error::{JournalResult, LogFailure};
use crate::storage::{validate_slot_name, SlotStore};

/// Metadata about one timestamped backup
#[derive(Debug, Clone, Serialize)]
pub struct BackupInfo {
    /// Slot name
    pub slot: String,
    /// Capture epoch parsed from the slot name (0 if unparsable)
    pub epoch_millis: i64,
    /// Capture time derived from the epoch
    pub created_at: Option<DateTime<Utc>>,
    /// Stored size in bytes
    pub size_bytes: u64,
}

/// Creates, prunes, and recovers backups of individual keys
pub struct BackupStore {
    store: Arc<dyn SlotStore>,
    clock: Arc<dyn Clock>,
    /// Timestamped slots kept per key
    retention_count: usize,
}

impl BackupStore {
    pub fn new(store: Arc<dyn SlotStore>, clock: Arc<dyn Clock>, retention_count: usize) -> Self {
        Self {
            store,
            clock,
            retention_count: retention_count.max(1),
        }
    }

    pub fn retention_count(&self) -> usize {
        self.retention_count
    }

    /// Back up `value` for `key`, logging instead of failing
    pub fn create_backup(&self, key: &str, value: &Value) {
        self.try_create_backup(key, value)
            .log_failure(&format!("create backup of '{}'", key));
    }

    /// Back up `value` for `key`
    ///
    /// Returns the timestamped slot that was written.
    pub fn try_create_backup(&self, key: &str, value: &Value) -> JournalResult<BackupInfo> {
        validate_slot_name(key)?;

        let now = self.clock.now();
        let record = SnapshotRecord::capture(value.clone(), now);
        let raw = record.to_json()?;

        self.store.set(&primary_backup_slot(key), &raw)?;

        let epoch_millis = now.timestamp_millis();
        let slot = timestamped_slot(key, epoch_millis);
        self.store.set(&slot, &raw)?;

        let pruned = self.prune_old_backups(key);
        tracing::debug!(key, slot = %slot, pruned = pruned.len(), "backup created");

        Ok(BackupInfo {
            slot,
            epoch_millis,
            created_at: Some(now),
            size_bytes: raw.len() as u64,
        })
    }

    /// Delete all but the newest `retention_count` timestamped slots of `key`
    ///
    /// Returns the deleted slot names. Failures are logged and skipped.
    pub fn prune_old_backups(&self, key: &str) -> Vec<String> {
        let Some(slots) = self
            .timestamped_slots(key)
            .log_failure(&format!("list backups of '{}'", key))
        else {
            return Vec::new();
        };

        let mut deleted = Vec::new();
        for (slot, _) in slots.into_iter().skip(self.retention_count) {
            if self
                .store
                .remove(&slot)
                .log_failure(&format!("delete old backup '{}'", slot))
                .is_some()
            {
                deleted.push(slot);
            }
        }

        if !deleted.is_empty() {
            tracing::debug!(key, deleted = ?deleted, "pruned old backups");
        }
        deleted
    }

    /// Most recent readable backup of `key`
    pub fn recover(&self, key: &str) -> Option<Value> {
        self.recover_record(key).map(SnapshotRecord::into_data)
    }

    /// Most recent readable backup record of `key`
    ///
    /// Tries the primary backup slot, then the timestamped slots newest
    /// first. Corrupt or unreadable records are skipped.
    pub fn recover_record(&self, key: &str) -> Option<SnapshotRecord> {
        let primary = primary_backup_slot(key);
        if let Some(record) = self.read_record(&primary) {
            return Some(record);
        }

        let slots = self
            .timestamped_slots(key)
            .log_failure(&format!("list backups of '{}'", key))?;

        for (slot, _) in slots {
            if let Some(record) = self.read_record(&slot) {
                tracing::info!(key, slot = %slot, "recovered from timestamped backup");
                return Some(record);
            }
        }

        tracing::debug!(key, "no recoverable backup");
        None
    }

    /// Timestamped backups of `key`, newest first
    pub fn list_backups(&self, key: &str) -> JournalResult<Vec<BackupInfo>> {
        let mut backups = Vec::new();
        for (slot, epoch_millis) in self.timestamped_slots(key)? {
            let size_bytes = self.store.size(&slot)?.unwrap_or(0);
            backups.push(BackupInfo {
                slot,
                epoch_millis,
                created_at: DateTime::from_timestamp_millis(epoch_millis),
                size_bytes,
            });
        }
        Ok(backups)
    }

    /// Remove the primary backup slot and every timestamped slot of `key`
    ///
    /// Returns how many slots existed and were removed.
    pub fn delete_key_space(&self, key: &str) -> JournalResult<usize> {
        let mut removed = 0;

        let primary = primary_backup_slot(key);
        if self.store.get(&primary)?.is_some() {
            self.store.remove(&primary)?;
            removed += 1;
        }

        for (slot, _) in self.timestamped_slots(key)? {
            self.store.remove(&slot)?;
            removed += 1;
        }

        tracing::debug!(key, removed, "deleted backup key space");
        Ok(removed)
    }

    /// Timestamped slots of `key` sorted by epoch descending
    fn timestamped_slots(&self, key: &str) -> JournalResult<Vec<(String, i64)>> {
        let mut slots: Vec<(String, i64)> = self
            .store
            .keys_with_prefix(&timestamped_prefix(key))?
            .into_iter()
            .filter_map(|slot| timestamped_epoch(key, &slot).map(|epoch| (slot, epoch)))
            .collect();

        slots.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| b.0.cmp(&a.0)));
        Ok(slots)
    }

    fn read_record(&self, slot: &str) -> Option<SnapshotRecord> {
        let raw = self
            .store
            .get(slot)
            .log_failure(&format!("read backup '{}'", slot))??;

        match SnapshotRecord::from_json(&raw) {
            Ok(record) => Some(record),
            Err(err) => {
                tracing::warn!(slot, error = %err, "skipping corrupt backup");
                None
            }
        }
    }
}
