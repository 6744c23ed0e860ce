//! Stored backup shapes and slot naming
//!
//! The slot names and JSON shapes here are read by other clients of the same
//! store and must stay bit-exact:
//!
//! - `backup_<key>`: latest `SnapshotRecord` for `key`
//! - `backup_<key>_<epochMillis>`: one timestamped `SnapshotRecord`
//! - `latestFullBackup`: the `FullSnapshot`

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::JournalResult;

/// Version tag written into every record
pub const FORMAT_VERSION: &str = "1.0";

/// Slot holding the cross-key snapshot
pub const FULL_SNAPSHOT_SLOT: &str = "latestFullBackup";

const BACKUP_SLOT_PREFIX: &str = "backup_";

/// Primary backup slot for `key`
pub fn primary_backup_slot(key: &str) -> String {
    format!("{}{}", BACKUP_SLOT_PREFIX, key)
}

/// Timestamped backup slot for `key` captured at `epoch_millis`
pub fn timestamped_slot(key: &str, epoch_millis: i64) -> String {
    format!("{}{}_{}", BACKUP_SLOT_PREFIX, key, epoch_millis)
}

/// Common prefix of every timestamped slot of `key`
pub fn timestamped_prefix(key: &str) -> String {
    format!("{}{}_", BACKUP_SLOT_PREFIX, key)
}

/// Epoch of a timestamped slot belonging to `key`
///
/// A slot belongs to `key` when the rest of the name after
/// `backup_<key>_` is non-empty, has no `_` (so `backup_<key>_other_1` stays
/// with key `<key>_other`), and starts with a digit. A suffix that starts
/// with a digit but does not parse (trailing garbage, overflow) counts as
/// epoch 0: it sorts last and is pruned first.
pub fn timestamped_epoch(key: &str, slot: &str) -> Option<i64> {
    let suffix = slot.strip_prefix(&timestamped_prefix(key))?;

    if suffix.contains('_') || !suffix.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }

    Some(suffix.parse::<i64>().unwrap_or(0))
}

/// ISO-8601 with millisecond precision and a `Z` suffix
mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

/// One captured copy of a key's value
///
/// Immutable: a new backup always produces a new record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    data: Value,
    #[serde(with = "iso_millis")]
    timestamp: DateTime<Utc>,
    version: String,
}

impl SnapshotRecord {
    pub fn capture(data: Value, timestamp: DateTime<Utc>) -> Self {
        Self {
            data,
            timestamp,
            version: FORMAT_VERSION.to_string(),
        }
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn into_data(self) -> Value {
        self.data
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn to_json(&self) -> JournalResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(raw: &str) -> JournalResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Every tracked slot's raw value, captured at one instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullSnapshot {
    #[serde(with = "iso_millis")]
    timestamp: DateTime<Utc>,
    version: String,
    data: BTreeMap<String, String>,
}

impl FullSnapshot {
    pub fn capture(data: BTreeMap<String, String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            version: FORMAT_VERSION.to_string(),
            data,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Raw slot values keyed by slot name
    pub fn slots(&self) -> &BTreeMap<String, String> {
        &self.data
    }

    pub fn slot_count(&self) -> usize {
        self.data.len()
    }

    pub fn to_json(&self) -> JournalResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(raw: &str) -> JournalResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn at(millis: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(millis).unwrap()
    }

    #[test]
    fn test_slot_names() {
        assert_eq!(primary_backup_slot("j1"), "backup_j1");
        assert_eq!(timestamped_slot("j1", 1_700_000_000_000), "backup_j1_1700000000000");
        assert_eq!(timestamped_prefix("j1"), "backup_j1_");
    }

    #[test]
    fn test_timestamped_epoch() {
        assert_eq!(timestamped_epoch("j1", "backup_j1_1700000000000"), Some(1_700_000_000_000));
        // Unparsable suffixes sort as epoch 0
        assert_eq!(timestamped_epoch("j1", "backup_j1_17abc"), Some(0));
        assert_eq!(timestamped_epoch("j1", "backup_j1_99999999999999999999999"), Some(0));

        assert_eq!(timestamped_epoch("j1", "backup_j1"), None);
        assert_eq!(timestamped_epoch("j1", "backup_j1_"), None);
        assert_eq!(timestamped_epoch("j1", "backup_j1_notes"), None);
        // Belongs to key "j1_x", not "j1"
        assert_eq!(timestamped_epoch("j1", "backup_j1_x_1700000000000"), None);
        assert_eq!(timestamped_epoch("j1_x", "backup_j1_x_1700000000000"), Some(1_700_000_000_000));
    }

    #[test]
    fn test_record_wire_shape() {
        let record = SnapshotRecord::capture(json!({"a": 1}), at(1_700_000_000_000));
        let raw = record.to_json().unwrap();

        assert_eq!(
            raw,
            r#"{"data":{"a":1},"timestamp":"2023-11-14T22:13:20.000Z","version":"1.0"}"#
        );
        assert_eq!(SnapshotRecord::from_json(&raw).unwrap(), record);
    }

    #[test]
    fn test_record_accepts_other_iso_forms() {
        let raw = r#"{"data":[1,2],"timestamp":"2023-11-14T22:13:20+00:00","version":"1.0"}"#;
        let record = SnapshotRecord::from_json(raw).unwrap();
        assert_eq!(record.timestamp(), at(1_700_000_000_000));
        assert_eq!(record.data(), &json!([1, 2]));
    }

    #[test]
    fn test_corrupt_record_rejected() {
        assert!(SnapshotRecord::from_json("not json").is_err());
        assert!(SnapshotRecord::from_json(r#"{"data":1}"#).is_err());
    }

    #[test]
    fn test_full_snapshot_wire_shape() {
        let mut data = BTreeMap::new();
        data.insert("tradingJournalData_1".to_string(), r#"[{"pnl":5}]"#.to_string());
        let snapshot = FullSnapshot::capture(data, at(1_700_000_000_000));

        let raw = snapshot.to_json().unwrap();
        assert_eq!(
            raw,
            r#"{"timestamp":"2023-11-14T22:13:20.000Z","version":"1.0","data":{"tradingJournalData_1":"[{\"pnl\":5}]"}}"#
        );
        assert_eq!(FullSnapshot::from_json(&raw).unwrap().slot_count(), 1);
    }
}
