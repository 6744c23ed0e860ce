//! Custom error types for tradejournal
//!
//! This module defines the error hierarchy for the backup core using thiserror,
//! plus the `LogFailure` extension used wherever a fault must be logged and
//! swallowed instead of propagated.

use thiserror::Error;

/// The main error type for tradejournal operations
#[derive(Error, Debug)]
pub enum JournalError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Validation errors (bad slot names, malformed input)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// The store refused a write because it would exceed the quota
    #[error("Storage quota exceeded writing '{slot}': need {needed} bytes, limit {limit}")]
    QuotaExceeded {
        slot: String,
        needed: u64,
        limit: u64,
    },

    /// Export errors
    #[error("Export error: {0}")]
    Export(String),

    /// Import errors
    #[error("Import error: {0}")]
    Import(String),
}

impl JournalError {
    /// Create a "not found" error for a slot
    pub fn slot_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Slot",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for a backup
    pub fn backup_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Backup",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a quota error
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, Self::QuotaExceeded { .. })
    }
}

impl From<std::io::Error> for JournalError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for JournalError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for tradejournal operations
pub type JournalResult<T> = Result<T, JournalError>;

/// Turns a failed operation into `None`, logging the fault.
///
/// The backup paths are a safety net: their faults are reported through
/// `tracing` and never change the caller's control flow.
pub trait LogFailure<T> {
    /// Log the error (if any) under `operation` and discard it
    fn log_failure(self, operation: &str) -> Option<T>;
}

impl<T> LogFailure<T> for JournalResult<T> {
    fn log_failure(self, operation: &str) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(operation, error = %err, "operation failed");
                None
            }
        }
    }
}
