//! Path management for tradejournal
//!
//! ## Path Resolution Order
//!
//! 1. `TRADEJOURNAL_DATA_DIR` environment variable (if set)
//! 2. The platform data directory from `directories::ProjectDirs`
//!    (`~/.local/share/tradejournal` on Linux)

use std::path::PathBuf;

use directories::ProjectDirs;

use crate::error::JournalError;

/// Environment variable overriding the base directory
pub const DATA_DIR_ENV: &str = "TRADEJOURNAL_DATA_DIR";

/// Manages all paths used by tradejournal
#[derive(Debug, Clone)]
pub struct JournalPaths {
    /// Base directory for all tradejournal data
    base_dir: PathBuf,
}

impl JournalPaths {
    /// Create a new JournalPaths instance
    ///
    /// # Errors
    ///
    /// Returns an error if no home directory can be determined and the
    /// override variable is not set.
    pub fn new() -> Result<Self, JournalError> {
        let base_dir = if let Ok(custom) = std::env::var(DATA_DIR_ENV) {
            PathBuf::from(custom)
        } else {
            resolve_default_path()?
        };

        Ok(Self { base_dir })
    }

    /// Create JournalPaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Directory holding one file per storage slot
    pub fn slots_dir(&self) -> PathBuf {
        self.base_dir.join("slots")
    }

    /// Default directory for snapshot exports
    pub fn exports_dir(&self) -> PathBuf {
        self.base_dir.join("exports")
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Ensure all required directories exist
    pub fn ensure_directories(&self) -> Result<(), JournalError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| JournalError::Io(format!("Failed to create base directory: {}", e)))?;

        std::fs::create_dir_all(self.slots_dir())
            .map_err(|e| JournalError::Io(format!("Failed to create slots directory: {}", e)))?;

        std::fs::create_dir_all(self.exports_dir())
            .map_err(|e| JournalError::Io(format!("Failed to create exports directory: {}", e)))?;

        Ok(())
    }

    /// Check if tradejournal has been initialized (config file exists)
    pub fn is_initialized(&self) -> bool {
        self.settings_file().exists()
    }
}

fn resolve_default_path() -> Result<PathBuf, JournalError> {
    ProjectDirs::from("", "", "tradejournal")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| JournalError::Config("Could not determine a home directory".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_custom_base_dir() {
        let temp_dir = TempDir::new().unwrap();
        let paths = JournalPaths::with_base_dir(temp_dir.path().to_path_buf());

        assert_eq!(paths.base_dir(), temp_dir.path());
        assert_eq!(paths.slots_dir(), temp_dir.path().join("slots"));
        assert_eq!(paths.exports_dir(), temp_dir.path().join("exports"));
        assert_eq!(paths.settings_file(), temp_dir.path().join("config.json"));
    }

    #[test]
    fn test_ensure_directories() {
        let temp_dir = TempDir::new().unwrap();
        let paths = JournalPaths::with_base_dir(temp_dir.path().join("nested"));

        assert!(!paths.is_initialized());
        paths.ensure_directories().unwrap();

        assert!(paths.slots_dir().exists());
        assert!(paths.exports_dir().exists());
    }
}
