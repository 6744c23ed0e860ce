//! Export module for tradejournal
//!
//! Writes the full snapshot to a standalone file and reads such files back:
//! - JSON: the stored `latestFullBackup` shape
//! - YAML: the same data, human-readable

pub mod json;
pub mod yaml;

pub use json::{export_snapshot_json, import_from_json};
pub use yaml::{export_snapshot_yaml, import_from_yaml};

use std::io::Write;
use std::path::Path;

use clap::ValueEnum;

use crate::backup::FullSnapshot;
use crate::error::{JournalError, JournalResult};

/// Export format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    /// JSON, same shape as the stored snapshot
    Json,
    /// YAML, human-readable
    Yaml,
}

impl ExportFormat {
    /// Guess the format from a file extension, defaulting to JSON
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::Yaml,
            _ => Self::Json,
        }
    }
}

/// Write `snapshot` in the requested format
pub fn export_snapshot<W: Write>(
    snapshot: &FullSnapshot,
    format: ExportFormat,
    writer: &mut W,
) -> JournalResult<()> {
    match format {
        ExportFormat::Json => export_snapshot_json(snapshot, writer, true),
        ExportFormat::Yaml => export_snapshot_yaml(snapshot, writer),
    }
}

/// Parse an export in either format
pub fn import_snapshot(contents: &str) -> JournalResult<FullSnapshot> {
    let snapshot = match import_from_json(contents) {
        Ok(snapshot) => snapshot,
        Err(json_err) => import_from_yaml(contents).map_err(|yaml_err| {
            JournalError::Import(format!(
                "not a JSON ({}) or YAML ({}) snapshot",
                json_err, yaml_err
            ))
        })?,
    };

    if snapshot.version() != crate::backup::FORMAT_VERSION {
        return Err(JournalError::Import(format!(
            "Unsupported snapshot version '{}'",
            snapshot.version()
        )));
    }
    Ok(snapshot)
}
