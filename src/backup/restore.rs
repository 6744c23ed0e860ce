//! Full snapshot restoration for tradejournal
//!
//! Writes the raw slot values of a `FullSnapshot` back into the store.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::record::{FullSnapshot, FORMAT_VERSION};
use crate::error::{JournalError, JournalResult};
use crate::storage::SlotStore;

/// Handles restoring from full snapshots
pub struct RestoreManager {
    store: Arc<dyn SlotStore>,
    /// Only slots under these prefixes are written back
    tracked_prefixes: Vec<String>,
}

impl RestoreManager {
    pub fn new(store: Arc<dyn SlotStore>, tracked_prefixes: Vec<String>) -> Self {
        Self {
            store,
            tracked_prefixes,
        }
    }

    /// Write every tracked slot of `snapshot` back into the store
    ///
    /// This overwrites the current values of those slots. Slots that fail
    /// to write are reported in the result instead of aborting the restore.
    pub fn restore_snapshot(&self, snapshot: &FullSnapshot) -> JournalResult<RestoreResult> {
        if snapshot.version() != FORMAT_VERSION {
            return Err(JournalError::Import(format!(
                "Unsupported snapshot version '{}'",
                snapshot.version()
            )));
        }

        let mut result = RestoreResult {
            snapshot_date: snapshot.timestamp(),
            ..RestoreResult::default()
        };

        for (slot, raw) in snapshot.slots() {
            if !self.is_tracked(slot) {
                result.skipped.push(slot.clone());
                continue;
            }

            match self.store.set(slot, raw) {
                Ok(()) => result.restored.push(slot.clone()),
                Err(err) => {
                    tracing::warn!(slot = %slot, error = %err, "failed to restore slot");
                    result.failed.push(slot.clone());
                }
            }
        }

        tracing::info!(
            restored = result.restored.len(),
            failed = result.failed.len(),
            skipped = result.skipped.len(),
            "snapshot restored"
        );
        Ok(result)
    }

    /// Inspect a snapshot without writing anything
    pub fn validate_snapshot(&self, snapshot: &FullSnapshot) -> ValidationResult {
        let per_prefix = self
            .tracked_prefixes
            .iter()
            .map(|prefix| {
                let count = snapshot.slots().keys().filter(|k| k.starts_with(prefix)).count();
                (prefix.clone(), count)
            })
            .collect();

        let unparsable = snapshot
            .slots()
            .iter()
            .filter(|(_, raw)| serde_json::from_str::<serde_json::Value>(raw).is_err())
            .map(|(slot, _)| slot.clone())
            .collect();

        let untracked = snapshot
            .slots()
            .keys()
            .filter(|slot| !self.is_tracked(slot))
            .count();

        ValidationResult {
            is_valid: snapshot.version() == FORMAT_VERSION,
            version: snapshot.version().to_string(),
            snapshot_date: snapshot.timestamp(),
            slot_count: snapshot.slot_count(),
            per_prefix,
            unparsable,
            untracked,
        }
    }

    fn is_tracked(&self, slot: &str) -> bool {
        self.tracked_prefixes.iter().any(|p| slot.starts_with(p.as_str()))
    }
}

/// Result of a restore operation
#[derive(Debug, Default)]
pub struct RestoreResult {
    /// Capture time of the restored snapshot
    pub snapshot_date: DateTime<Utc>,
    /// Slots written back
    pub restored: Vec<String>,
    /// Slots the store refused
    pub failed: Vec<String>,
    /// Slots outside the tracked prefixes
    pub skipped: Vec<String>,
}

impl RestoreResult {
    pub fn all_restored(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn summary(&self) -> String {
        let mut summary = format!("Restored {} slot(s)", self.restored.len());
        if !self.failed.is_empty() {
            summary.push_str(&format!(", {} failed ({})", self.failed.len(), self.failed.join(", ")));
        }
        if !self.skipped.is_empty() {
            summary.push_str(&format!(", {} untracked skipped", self.skipped.len()));
        }
        summary
    }
}

/// Result of validating a snapshot
#[derive(Debug)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub version: String,
    pub snapshot_date: DateTime<Utc>,
    pub slot_count: usize,
    /// Slot count per tracked prefix
    pub per_prefix: Vec<(String, usize)>,
    /// Slots whose raw value is not valid JSON
    pub unparsable: Vec<String>,
    /// Slots that a restore would skip
    pub untracked: usize,
}

impl ValidationResult {
    pub fn summary(&self) -> String {
        if !self.is_valid {
            return format!("Unsupported snapshot (v{})", self.version);
        }

        let counts: Vec<String> = self
            .per_prefix
            .iter()
            .map(|(prefix, count)| format!("{}* {}", prefix, count))
            .collect();

        if self.unparsable.is_empty() {
            format!("Snapshot v{} with {} slot(s): {}", self.version, self.slot_count, counts.join(", "))
        } else {
            format!(
                "Snapshot v{} with {} slot(s): {}; {} unparsable",
                self.version,
                self.slot_count,
                counts.join(", "),
                self.unparsable.len()
            )
        }
    }
}
