//! datesort - move files into date-named directories
//!
//! This library lists the files directly inside a source directory, derives a
//! date for each one (from a `YYYYMMDD` filename prefix or the modification
//! time), and moves them into `YYYY_MM_DD` subdirectories of a target
//! directory. Backups, extension filters and an append-only audit log are
//! supported.

pub mod audit_log;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod error;
pub mod mover;
pub mod output;

pub use audit_log::{AuditLog, LogLevel};
pub use classifier::{DateKey, GroupedFiles, SortKey, classify};
pub use config::{ConfigError, ConfigFile, ExtensionFilter, SettingsOverrides, SortSettings};
pub use error::{SortError, SortResult};
pub use mover::{Mover, RunCounters, move_files};

pub use cli::{Command, preview, run_cli, run_sort};
