//! Backup CLI commands
//!
//! Implements CLI commands for per-key backup management.

use chrono::Utc;
use clap::Subcommand;
use serde_json::Value;

use crate::display::format_backup_list;
use crate::error::{JournalError, JournalResult};
use crate::services::JournalCore;

/// Backup subcommands
#[derive(Subcommand)]
pub enum BackupCommands {
    /// Back up the current value of a key
    Create {
        /// Slot key
        key: String,
    },

    /// List the timestamped backups of a key
    List {
        /// Slot key
        key: String,
    },

    /// Delete timestamped backups beyond the retention count
    Prune {
        /// Slot key
        key: String,
    },
}

/// Handle a backup command
pub fn handle_backup_command(core: &JournalCore, cmd: BackupCommands) -> JournalResult<()> {
    match cmd {
        BackupCommands::Create { key } => {
            let raw = core
                .store
                .get(&key)?
                .ok_or_else(|| JournalError::slot_not_found(key.as_str()))?;
            let value: Value = serde_json::from_str(&raw)
                .map_err(|e| JournalError::Json(format!("Live slot '{}' is corrupt: {}", key, e)))?;

            let info = core.backups.try_create_backup(&key, &value)?;
            println!("Backup created: {}", info.slot);
        }

        BackupCommands::List { key } => {
            let backups = core.backups.list_backups(&key)?;

            if backups.is_empty() {
                println!("No backups found for '{}'.", key);
                println!("Create one with: tradejournal backup create {}", key);
                return Ok(());
            }

            println!("{}", format_backup_list(&backups, Utc::now()));
            println!();
            println!(
                "Total: {} backup(s), retention {}",
                backups.len(),
                core.backups.retention_count()
            );
        }

        BackupCommands::Prune { key } => {
            let deleted = core.backups.prune_old_backups(&key);
            if deleted.is_empty() {
                println!("No backups to prune.");
            } else {
                println!("Deleted {} backup(s).", deleted.len());
            }
        }
    }

    Ok(())
}
