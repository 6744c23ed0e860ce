//! Journal slot CLI commands
//!
//! Implements `save`, `get`, `recover`, and `delete` on top of `SafeWriter`.

use serde_json::Value;

use crate::error::{JournalError, JournalResult};
use crate::services::JournalCore;

/// Save a JSON value under `key`
pub fn handle_save(core: &JournalCore, key: &str, raw_value: &str) -> JournalResult<()> {
    let value: Value = serde_json::from_str(raw_value)
        .map_err(|e| JournalError::Validation(format!("Value is not valid JSON: {}", e)))?;

    if !core.writer.save(key, &value) {
        return Err(JournalError::Storage(format!(
            "Failed to save '{}' and no backup could be restored",
            key
        )));
    }

    println!("Saved: {}", key);
    Ok(())
}

/// Print the value of `key`, recovering from backup if needed
pub fn handle_get(core: &JournalCore, key: &str) -> JournalResult<()> {
    let value = core
        .writer
        .load(key)
        .ok_or_else(|| JournalError::slot_not_found(key))?;

    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

/// Print the most recent backup of `key`
pub fn handle_recover(core: &JournalCore, key: &str) -> JournalResult<()> {
    match core.backups.recover_record(key) {
        Some(record) => {
            eprintln!(
                "Backup captured {}",
                record.timestamp().format("%Y-%m-%d %H:%M:%S%.3f UTC")
            );
            println!("{}", serde_json::to_string_pretty(record.data())?);
            Ok(())
        }
        None => Err(JournalError::backup_not_found(key)),
    }
}

/// Delete `key` and all of its backups
pub fn handle_delete(core: &JournalCore, key: &str, force: bool) -> JournalResult<()> {
    let backups = core.backups.list_backups(key)?;

    if !force {
        println!(
            "This will delete '{}' and {} timestamped backup(s).",
            key,
            backups.len()
        );
        println!("To proceed, run again with --force flag:");
        println!("  tradejournal delete {} --force", key);
        return Ok(());
    }

    let removed = core.writer.delete(key)?;
    if removed == 0 {
        return Err(JournalError::slot_not_found(key));
    }

    println!("Deleted {} slot(s) for '{}'.", removed, key);
    Ok(())
}
