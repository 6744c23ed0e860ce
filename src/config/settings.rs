//! User settings for tradejournal
//!
//! Retention, snapshot timing, and storage quota. Every field has a serde
//! default so older or partial config files keep loading.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::paths::JournalPaths;
use crate::error::JournalError;

/// Per-key backup settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupSettings {
    /// Number of timestamped backups kept per key
    #[serde(default = "default_retention_count")]
    pub retention_count: usize,

    /// Slot prefixes swept into the full snapshot
    #[serde(default = "default_tracked_prefixes")]
    pub tracked_prefixes: Vec<String>,
}

impl Default for BackupSettings {
    fn default() -> Self {
        Self {
            retention_count: default_retention_count(),
            tracked_prefixes: default_tracked_prefixes(),
        }
    }
}

/// Full snapshot scheduling settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotSettings {
    /// Delay between a write-triggered request and its execution
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Minimum time since the last snapshot before a write may trigger another
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,

    /// Unconditional snapshot interval
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// How often the timer thread polls the snapshotter
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

impl SnapshotSettings {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

impl Default for SnapshotSettings {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            cooldown_ms: default_cooldown_ms(),
            interval_secs: default_interval_secs(),
            tick_ms: default_tick_ms(),
        }
    }
}

/// Slot store settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Upper bound on the total size of all slots, in bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quota_bytes: Option<u64>,
}

/// User settings for tradejournal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    #[serde(default)]
    pub backup: BackupSettings,

    #[serde(default)]
    pub snapshot: SnapshotSettings,

    #[serde(default)]
    pub storage: StorageSettings,
}

fn default_schema_version() -> u32 {
    1
}

fn default_retention_count() -> usize {
    5
}

fn default_tracked_prefixes() -> Vec<String> {
    vec![
        "tradingJournalData_".to_string(),
        "tradingJournalFolders_".to_string(),
    ]
}

fn default_debounce_ms() -> u64 {
    1000
}

fn default_cooldown_ms() -> u64 {
    3000
}

fn default_interval_secs() -> u64 {
    60
}

fn default_tick_ms() -> u64 {
    250
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            backup: BackupSettings::default(),
            snapshot: SnapshotSettings::default(),
            storage: StorageSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or create default settings if file doesn't exist
    pub fn load_or_create(paths: &JournalPaths) -> Result<Self, JournalError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path).map_err(|e| {
                JournalError::Io(format!("Failed to read settings file: {}", e))
            })?;

            let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
                JournalError::Config(format!("Failed to parse settings file: {}", e))
            })?;

            settings.validate()?;
            Ok(settings)
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(Settings::default())
        }
    }

    /// Reject values the backup core cannot work with
    pub fn validate(&self) -> Result<(), JournalError> {
        if self.backup.retention_count == 0 {
            return Err(JournalError::Config(
                "backup.retention_count must be at least 1".into(),
            ));
        }
        if self.snapshot.interval_secs == 0 {
            return Err(JournalError::Config(
                "snapshot.interval_secs must be at least 1".into(),
            ));
        }
        if self.snapshot.tick_ms == 0 {
            return Err(JournalError::Config(
                "snapshot.tick_ms must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Save settings to disk
    pub fn save(&self, paths: &JournalPaths) -> Result<(), JournalError> {
        paths.ensure_directories()?;

        let settings_path = paths.settings_file();
        let contents = serde_json::to_string_pretty(self).map_err(|e| {
            JournalError::Config(format!("Failed to serialize settings: {}", e))
        })?;

        std::fs::write(&settings_path, contents).map_err(|e| {
            JournalError::Io(format!("Failed to write settings file: {}", e))
        })?;

        Ok(())
    }
}
