//! Full snapshot CLI commands
//!
//! Commands for the cross-key `latestFullBackup` snapshot, plus a
//! foreground runner for the snapshot timer.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use clap::Subcommand;

use crate::backup::{FullSnapshot, SnapshotTimer};
use crate::config::paths::JournalPaths;
use crate::config::settings::Settings;
use crate::display::{format_snapshot_details, format_snapshotter_status};
use crate::error::{JournalError, JournalResult};
use crate::export::{export_snapshot, import_snapshot, ExportFormat};
use crate::services::JournalCore;

/// Snapshot subcommands
#[derive(Subcommand)]
pub enum SnapshotCommands {
    /// Capture every tracked slot into latestFullBackup now
    Run,

    /// Show the stored full snapshot
    Show,

    /// Write the full snapshot to a file
    Export {
        /// Output file (defaults to the exports directory)
        output: Option<PathBuf>,

        /// Export format (guessed from the extension when omitted)
        #[arg(short, long, value_enum)]
        format: Option<ExportFormat>,

        /// Capture a fresh snapshot instead of exporting the stored one
        #[arg(long)]
        fresh: bool,
    },

    /// Restore tracked slots from an exported file or "latest"
    Restore {
        /// Export file path, or "latest" for the stored snapshot
        source: String,

        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Run the snapshot timer in the foreground
    Watch {
        /// Stop after this many seconds
        #[arg(short, long, default_value = "60")]
        seconds: u64,
    },
}

/// Handle a snapshot command
pub fn handle_snapshot_command(
    core: &JournalCore,
    paths: &JournalPaths,
    settings: &Settings,
    cmd: SnapshotCommands,
) -> JournalResult<()> {
    match cmd {
        SnapshotCommands::Run => {
            let snapshot = core
                .snapshotter
                .execute_snapshot()
                .ok_or_else(|| JournalError::Storage("Failed to write full snapshot".into()))?;
            println!("Full snapshot written: {} slot(s)", snapshot.slot_count());
        }

        SnapshotCommands::Show => match core.snapshotter.latest_snapshot()? {
            Some(snapshot) => {
                println!("Full Snapshot");
                println!("=============");
                print!("{}", format_snapshot_details(&snapshot));
            }
            None => {
                println!("No full snapshot stored yet.");
                println!("Create one with: tradejournal snapshot run");
            }
        },

        SnapshotCommands::Export {
            output,
            format,
            fresh,
        } => {
            let snapshot = if fresh {
                None
            } else {
                core.snapshotter.latest_snapshot()?
            };
            let snapshot = match snapshot {
                Some(snapshot) => snapshot,
                None => core
                    .snapshotter
                    .execute_snapshot()
                    .ok_or_else(|| JournalError::Export("Failed to capture snapshot".into()))?,
            };

            let output = match output {
                Some(path) => path,
                None => {
                    paths.ensure_directories()?;
                    default_export_path(paths, format.unwrap_or(ExportFormat::Json))
                }
            };
            let format = format.unwrap_or_else(|| ExportFormat::from_path(&output));

            write_export(&snapshot, format, &output)?;
            println!(
                "Full snapshot ({} slot(s)) exported to: {}",
                snapshot.slot_count(),
                output.display()
            );
        }

        SnapshotCommands::Restore { source, force } => {
            let snapshot = load_restore_source(core, &source)?;
            let validation = core.restore.validate_snapshot(&snapshot);

            println!("Snapshot Information");
            println!("====================");
            println!("Source: {}", source);
            println!(
                "Captured: {}",
                validation.snapshot_date.format("%Y-%m-%d %H:%M:%S UTC")
            );
            println!("Status: {}", validation.summary());
            if validation.untracked > 0 {
                println!("Untracked slots (skipped): {}", validation.untracked);
            }
            println!();

            if !validation.is_valid {
                return Err(JournalError::Import(validation.summary()));
            }

            if !force {
                println!("WARNING: This will overwrite the tracked journal slots!");
                println!("To proceed, run again with --force flag:");
                println!("  tradejournal snapshot restore {} --force", source);
                return Ok(());
            }

            println!("Exporting current data before restore...");
            paths.ensure_directories()?;
            let pre_restore = paths.exports_dir().join(format!(
                "pre-restore-{}.json",
                Utc::now().format("%Y%m%d-%H%M%S")
            ));
            match core.snapshotter.execute_snapshot() {
                Some(current) => {
                    write_export(&current, ExportFormat::Json, &pre_restore)?;
                    println!("Pre-restore export: {}", pre_restore.display());
                }
                None => println!("Could not capture current data; continuing."),
            }
            println!();

            let result = core.restore.restore_snapshot(&snapshot)?;
            println!("Restore complete!");
            println!("{}", result.summary());

            if !result.all_restored() {
                return Err(JournalError::Storage(format!(
                    "{} slot(s) could not be restored",
                    result.failed.len()
                )));
            }
        }

        SnapshotCommands::Watch { seconds } => {
            println!(
                "Watching {} for {}s (interval {}s)...",
                paths.slots_dir().display(),
                seconds,
                settings.snapshot.interval_secs
            );

            let timer = SnapshotTimer::start(
                std::sync::Arc::clone(&core.snapshotter),
                settings.snapshot.tick_rate(),
            )
            .ok_or_else(|| JournalError::Storage("A snapshot timer is already running".into()))?;
            std::thread::sleep(Duration::from_secs(seconds));

            match timer.stop() {
                Some(snapshot) => {
                    println!("Final snapshot: {} slot(s)", snapshot.slot_count())
                }
                None => println!("Final snapshot failed; see log output."),
            }
            println!("{}", format_snapshotter_status(&core.snapshotter.status()));
        }
    }

    Ok(())
}

/// Resolve "latest" or read and parse an export file
fn load_restore_source(core: &JournalCore, source: &str) -> JournalResult<FullSnapshot> {
    if source == "latest" {
        return core
            .snapshotter
            .latest_snapshot()?
            .ok_or_else(|| JournalError::backup_not_found(crate::backup::FULL_SNAPSHOT_SLOT));
    }

    let path = Path::new(source);
    if !path.exists() {
        return Err(JournalError::NotFound {
            entity_type: "Export file",
            identifier: source.into(),
        });
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        JournalError::Import(format!("Failed to read {}: {}", path.display(), e))
    })?;
    import_snapshot(&contents)
}

fn default_export_path(paths: &JournalPaths, format: ExportFormat) -> PathBuf {
    let extension = match format {
        ExportFormat::Json => "json",
        ExportFormat::Yaml => "yaml",
    };
    paths.exports_dir().join(format!(
        "snapshot-{}.{}",
        Utc::now().format("%Y%m%d-%H%M%S"),
        extension
    ))
}

fn write_export(snapshot: &FullSnapshot, format: ExportFormat, output: &Path) -> JournalResult<()> {
    let file = File::create(output).map_err(|e| {
        JournalError::Export(format!("Failed to create file {}: {}", output.display(), e))
    })?;
    let mut writer = BufWriter::new(file);

    export_snapshot(snapshot, format, &mut writer)?;
    writer
        .flush()
        .map_err(|e| JournalError::Export(format!("Failed to write {}: {}", output.display(), e)))
}
