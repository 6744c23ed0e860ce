//! Backup system for tradejournal
//!
//! Journal data is protected by three tiers:
//!
//! - the live slot written by `SafeWriter`
//! - per-key backups: `backup_<key>` plus up to N rolling
//!   `backup_<key>_<epochMillis>` slots (`BackupStore`)
//! - a cross-key `latestFullBackup` snapshot of every tracked slot
//!   (`ScheduledSnapshotter`, driven by `SnapshotTimer`)
//!
//! `RestoreManager` writes a full snapshot back into the store.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tradejournal::backup::BackupStore;
//! use tradejournal::clock::SystemClock;
//! use tradejournal::storage::MemoryStore;
//!
//! let backups = BackupStore::new(Arc::new(MemoryStore::new()), Arc::new(SystemClock), 5);
//! backups.create_backup("tradingJournalData_main", &serde_json::json!([]));
//! let recovered = backups.recover("tradingJournalData_main");
//! ```

mod manager;
pub mod record;
mod restore;
mod snapshotter;
mod timer;

pub use manager::{BackupInfo, BackupStore};
pub use record::{FullSnapshot, SnapshotRecord, FORMAT_VERSION, FULL_SNAPSHOT_SLOT};
pub use restore::{RestoreManager, RestoreResult, ValidationResult};
pub use snapshotter::{
    LifecycleEvent, ScheduledSnapshotter, SnapshotPhase, SnapshotPolicy, SnapshotRequest,
    SnapshotterStatus, TickOutcome,
};
pub use timer::SnapshotTimer;
