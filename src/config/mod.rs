//! Configuration module for tradejournal
//!
//! This module provides configuration management including:
//! - Base directory resolution
//! - Settings persistence (retention, snapshot timing, quota)

pub mod paths;
pub mod settings;

pub use paths::JournalPaths;
pub use settings::Settings;
