//! Service layer for tradejournal
//!
//! `JournalCore` wires one slot store into the backup store, the snapshotter,
//! the safe writer, and the restore manager, so every component shares the
//! same store and clock.

pub mod safe_writer;

pub use safe_writer::SafeWriter;

use std::sync::Arc;

use crate::backup::{BackupStore, RestoreManager, ScheduledSnapshotter, SnapshotPolicy};
use crate::clock::{Clock, SystemClock};
use crate::config::paths::JournalPaths;
use crate::config::settings::Settings;
use crate::error::JournalResult;
use crate::storage::{FileSlotStore, SlotStore};

/// Main coordinator that provides access to all backup components
pub struct JournalCore {
    pub store: Arc<dyn SlotStore>,
    pub backups: Arc<BackupStore>,
    pub snapshotter: Arc<ScheduledSnapshotter>,
    pub writer: SafeWriter,
    pub restore: RestoreManager,
}

impl JournalCore {
    /// Open the file-backed store under `paths` with the wall clock
    pub fn open(paths: &JournalPaths, settings: &Settings) -> JournalResult<Self> {
        let store = FileSlotStore::open(paths, &settings.storage)?;
        Ok(Self::with_store(Arc::new(store), Arc::new(SystemClock), settings))
    }

    /// Build every component on top of an existing store and clock
    pub fn with_store(store: Arc<dyn SlotStore>, clock: Arc<dyn Clock>, settings: &Settings) -> Self {
        let backups = Arc::new(BackupStore::new(
            Arc::clone(&store),
            Arc::clone(&clock),
            settings.backup.retention_count,
        ));
        let snapshotter = Arc::new(ScheduledSnapshotter::new(
            Arc::clone(&store),
            clock,
            SnapshotPolicy::from_settings(&settings.backup, &settings.snapshot),
        ));
        let writer = SafeWriter::new(Arc::clone(&store), Arc::clone(&backups), Arc::clone(&snapshotter));
        let restore = RestoreManager::new(Arc::clone(&store), settings.backup.tracked_prefixes.clone());

        Self {
            store,
            backups,
            snapshotter,
            writer,
            restore,
        }
    }
}
