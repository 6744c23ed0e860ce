//! Backup display formatting
//!
//! Formats backup listings and snapshot details for terminal output.

use chrono::{DateTime, Utc};
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::backup::{BackupInfo, FullSnapshot, SnapshotterStatus};

#[derive(Tabled)]
struct BackupRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Slot")]
    slot: String,
    #[tabled(rename = "Captured")]
    captured: String,
    #[tabled(rename = "Age")]
    age: String,
    #[tabled(rename = "Size")]
    size: String,
}

/// Format timestamped backups (newest first) as a table
pub fn format_backup_list(backups: &[BackupInfo], now: DateTime<Utc>) -> String {
    if backups.is_empty() {
        return "No backups found.".to_string();
    }

    let rows: Vec<BackupRow> = backups
        .iter()
        .enumerate()
        .map(|(i, backup)| BackupRow {
            index: i + 1,
            slot: backup.slot.clone(),
            captured: backup
                .created_at
                .map(|t| t.format("%Y-%m-%d %H:%M:%S%.3f UTC").to_string())
                .unwrap_or_else(|| "-".to_string()),
            age: backup
                .created_at
                .map(|t| format_duration(now.signed_duration_since(t)))
                .unwrap_or_else(|| "-".to_string()),
            size: format_size(backup.size_bytes),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::psql());
    table.to_string()
}

/// Format a full snapshot summary
pub fn format_snapshot_details(snapshot: &FullSnapshot) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "Captured: {}\n",
        snapshot.timestamp().format("%Y-%m-%d %H:%M:%S UTC")
    ));
    output.push_str(&format!("Version:  {}\n", snapshot.version()));
    output.push_str(&format!("Slots:    {}\n", snapshot.slot_count()));

    for (slot, raw) in snapshot.slots() {
        output.push_str(&format!("  {} ({})\n", slot, format_size(raw.len() as u64)));
    }

    output
}

/// Format the snapshotter state
pub fn format_snapshotter_status(status: &SnapshotterStatus) -> String {
    let fmt_time = |t: Option<DateTime<Utc>>| {
        t.map(|t| t.format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "never".to_string())
    };

    format!(
        "snapshots: {}, last: {}, next interval: {}, pending: {:?}",
        status.executions,
        fmt_time(status.last_executed),
        fmt_time(status.next_interval),
        status.phase
    )
}

/// Format a duration in human-readable form
pub fn format_duration(duration: chrono::Duration) -> String {
    let total_seconds = duration.num_seconds();

    if total_seconds < 60 {
        return format!("{}s", total_seconds);
    }

    let minutes = total_seconds / 60;
    if minutes < 60 {
        return format!("{}m", minutes);
    }

    let hours = minutes / 60;
    if hours < 24 {
        return format!("{}h", hours);
    }

    let days = hours / 24;
    if days < 30 {
        return format!("{}d", days);
    }

    let months = days / 30;
    format!("{}mo", months)
}

/// Format a file size in human-readable form
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_format_backup_list() {
        let created = DateTime::from_timestamp_millis(1_700_000_000_000).unwrap();
        let backups = vec![BackupInfo {
            slot: "backup_j1_1700000000000".to_string(),
            epoch_millis: 1_700_000_000_000,
            created_at: Some(created),
            size_bytes: 2048,
        }];

        let output = format_backup_list(&backups, created + chrono::Duration::minutes(5));
        assert!(output.contains("backup_j1_1700000000000"));
        assert!(output.contains("2023-11-14 22:13:20.000 UTC"));
        assert!(output.contains("5m"));
        assert!(output.contains("2.0 KB"));
    }

    #[test]
    fn test_format_empty_list() {
        assert_eq!(format_backup_list(&[], Utc::now()), "No backups found.");
    }

    #[test]
    fn test_format_snapshot_details() {
        let mut data = BTreeMap::new();
        data.insert("tradingJournalData_a".to_string(), "[1,2]".to_string());
        let snapshot = FullSnapshot::capture(data, Utc::now());

        let output = format_snapshot_details(&snapshot);
        assert!(output.contains("Slots:    1"));
        assert!(output.contains("tradingJournalData_a (5 B)"));
    }

    #[test]
    fn test_format_duration_and_size() {
        assert_eq!(format_duration(chrono::Duration::seconds(42)), "42s");
        assert_eq!(format_duration(chrono::Duration::hours(3)), "3h");
        assert_eq!(format_duration(chrono::Duration::days(65)), "2mo");
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }
}
