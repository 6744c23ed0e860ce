//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer.

pub mod backup;
pub mod journal;
pub mod snapshot;

pub use backup::{handle_backup_command, BackupCommands};
pub use journal::{handle_delete, handle_get, handle_recover, handle_save};
pub use snapshot::{handle_snapshot_command, SnapshotCommands};
