//! tradejournal - Redundant local backups for trading journal data
//!
//! This library keeps journal data in named storage slots and protects it
//! with two independent backup tiers: rolling per-key backups written on
//! every save, and a periodic full snapshot of every tracked slot.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Base directory resolution and settings
//! - `error`: Custom error types
//! - `clock`: Injectable time source
//! - `storage`: The slot store trait with file and in-memory backends
//! - `backup`: Per-key backups, the full snapshotter, and restore
//! - `services`: `SafeWriter` and the `JournalCore` wiring
//! - `export`: JSON and YAML snapshot files
//! - `display`: Terminal formatting
//! - `cli`: Command handlers for the binary
//!
//! # Example
//!
//! ```rust,ignore
//! use tradejournal::config::{paths::JournalPaths, settings::Settings};
//! use tradejournal::services::JournalCore;
//!
//! let paths = JournalPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let core = JournalCore::open(&paths, &settings)?;
//! core.writer.save("tradingJournalData_main", &serde_json::json!([]));
//! ```

pub mod backup;
pub mod cli;
pub mod clock;
pub mod config;
pub mod display;
pub mod error;
pub mod export;
pub mod services;
pub mod storage;

pub use error::{JournalError, JournalResult};
