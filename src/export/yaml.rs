//! YAML export of a full snapshot
//!
//! Human-readable form of the same data as the JSON export.

use std::io::Write;

use crate::backup::FullSnapshot;
use crate::error::{JournalError, JournalResult};

/// Write `snapshot` as YAML with a comment header
pub fn export_snapshot_yaml<W: Write>(snapshot: &FullSnapshot, writer: &mut W) -> JournalResult<()> {
    let export_err = |e: std::io::Error| JournalError::Export(e.to_string());

    writeln!(writer, "# Trading journal full snapshot").map_err(export_err)?;
    writeln!(writer, "# Captured: {}", snapshot.timestamp()).map_err(export_err)?;
    writeln!(writer, "# Slots: {}", snapshot.slot_count()).map_err(export_err)?;
    writeln!(writer, "#").map_err(export_err)?;
    writeln!(writer, "# Restore with: tradejournal snapshot restore <file> --force").map_err(export_err)?;
    writeln!(writer).map_err(export_err)?;

    serde_yaml::to_writer(writer, snapshot).map_err(|e| JournalError::Export(e.to_string()))?;

    Ok(())
}

/// Parse a YAML export
pub fn import_from_yaml(yaml_str: &str) -> JournalResult<FullSnapshot> {
    serde_yaml::from_str(yaml_str).map_err(|e| JournalError::Import(e.to_string()))
}
