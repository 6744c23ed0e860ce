//! File I/O utilities with atomic writes
//!
//! Provides safe file operations that won't corrupt data on failure.

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error::JournalError;

/// Suffix of in-flight temp files (`<file>.<random>.tmp`); never a valid slot file
pub const TEMP_SUFFIX: &str = ".tmp";

/// Read a file to a string, returning `None` if it doesn't exist
pub fn read_optional<P: AsRef<Path>>(path: P) -> Result<Option<String>, JournalError> {
    let path = path.as_ref();

    match fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(JournalError::Storage(format!(
            "Failed to read {}: {}",
            path.display(),
            e
        ))),
    }
}

/// Write a string to a file atomically (write to temp, then rename)
///
/// The file is either completely written or not modified at all. Every
/// call writes its own uniquely named temp file, so concurrent writers to
/// the same path never share one; the last rename wins.
pub fn write_atomic<P: AsRef<Path>>(path: P, contents: &str) -> Result<(), JournalError> {
    let path = path.as_ref();

    // Same directory as the target, so the rename stays on one filesystem
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| {
        JournalError::Storage(format!("Failed to create directory {}: {}", dir.display(), e))
    })?;

    let mut prefix = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    prefix.push(".");

    let mut temp = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(TEMP_SUFFIX)
        .tempfile_in(dir)
        .map_err(|e| JournalError::Storage(format!("Failed to create temp file: {}", e)))?;

    temp.write_all(contents.as_bytes())
        .map_err(|e| JournalError::Storage(format!("Failed to write data: {}", e)))?;

    temp.flush()
        .map_err(|e| JournalError::Storage(format!("Failed to flush data: {}", e)))?;

    temp.as_file()
        .sync_all()
        .map_err(|e| JournalError::Storage(format!("Failed to sync data: {}", e)))?;

    // A failed persist drops the temp file with the error
    temp.persist(path)
        .map_err(|e| JournalError::Storage(format!("Failed to rename temp file: {}", e.error)))?;

    Ok(())
}
