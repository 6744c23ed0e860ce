//! JSON export of a full snapshot
//!
//! The file has exactly the stored `latestFullBackup` shape, so it can be
//! restored on any client of the same store.

use std::io::Write;

use crate::backup::FullSnapshot;
use crate::error::{JournalError, JournalResult};

/// Write `snapshot` as JSON
pub fn export_snapshot_json<W: Write>(
    snapshot: &FullSnapshot,
    writer: &mut W,
    pretty: bool,
) -> JournalResult<()> {
    if pretty {
        serde_json::to_writer_pretty(&mut *writer, snapshot)
    } else {
        serde_json::to_writer(&mut *writer, snapshot)
    }
    .map_err(|e| JournalError::Export(e.to_string()))?;

    writeln!(writer).map_err(|e| JournalError::Export(e.to_string()))?;
    Ok(())
}

/// Parse a JSON export
pub fn import_from_json(json_str: &str) -> JournalResult<FullSnapshot> {
    serde_json::from_str(json_str).map_err(|e| JournalError::Import(e.to_string()))
}
