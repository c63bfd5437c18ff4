//! Append-only audit log kept in the target directory.
//!
//! Every run appends a framed block: a header with the settings, one line per
//! directory or file decision, the totals, and a footer. The file is never
//! truncated, so it accumulates the history of all runs.

use crate::config::SortSettings;
use crate::error::{SortError, SortResult};
use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::warn;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";
const RULE_WIDTH: usize = 50;

/// Kind of audit line, each with its own layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// `<ts>: <message>`
    Info,
    /// `<ts>:  --> MOVING: <message> [Backup created.]`
    Moving,
    /// `<ts>:  --> WARNING: <message> Skipping move. [Backup not created.]`
    Warning,
    /// `<ts>: ERROR: <message> Exiting.`
    Error,
    /// The message verbatim.
    Decorating,
}

impl LogLevel {
    /// Formats one log entry. The backup clause only applies to `Moving` and `Warning`.
    pub fn render(self, timestamp: &str, message: &str, backup: bool) -> String {
        match self {
            LogLevel::Info => format!("{}: {}\n", timestamp, message),
            LogLevel::Moving => {
                let clause = if backup { " Backup created." } else { "" };
                format!("{}:  --> MOVING: {}{}\n", timestamp, message, clause)
            }
            LogLevel::Warning => {
                let clause = if backup { " Backup not created." } else { "" };
                format!(
                    "{}:  --> WARNING: {} Skipping move.{}\n",
                    timestamp, message, clause
                )
            }
            LogLevel::Error => format!("{}: ERROR: {} Exiting.\n", timestamp, message),
            LogLevel::Decorating => message.to_string(),
        }
    }
}

/// Current local time in the audit log's timestamp format.
pub fn timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Handle to the audit log file. Opening is deferred to each write.
#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one entry, creating the file if it does not exist.
    pub fn log(&self, level: LogLevel, message: &str, backup: bool) -> SortResult<()> {
        let line = level.render(&timestamp(), message, backup);
        self.append(&line)
    }

    pub fn info(&self, message: &str) -> SortResult<()> {
        self.log(LogLevel::Info, message, false)
    }

    pub fn error(&self, message: &str) -> SortResult<()> {
        self.log(LogLevel::Error, message, false)
    }

    pub fn decorate(&self, text: &str) -> SortResult<()> {
        self.log(LogLevel::Decorating, text, false)
    }

    /// Records an error that aborted the run.
    ///
    /// When the log itself is the thing that failed, the second failure is only
    /// reported through tracing and the caller keeps the original error.
    pub fn record_failure(&self, err: &SortError) {
        if let Err(log_err) = self.error(&err.to_string()) {
            warn!(error = %log_err, "could not record failure in audit log");
        }
    }

    /// Writes the run header: banner, settings block and separator.
    pub fn begin_run(&self, settings: &SortSettings) -> SortResult<()> {
        let stars = "*".repeat(RULE_WIDTH);
        let mut header = String::new();
        header.push_str(&format!("{}\n", stars));
        header.push_str(&format!("New Log Entry - {}\n", timestamp()));
        header.push_str(&format!("{}\n", stars));
        header.push_str("Settings:\n");
        header.push_str(&format!(
            "  - Source Directory: {}\n",
            settings.source_dir.display()
        ));
        header.push_str(&format!(
            "  - Target Directory: {}\n",
            settings.target_dir.display()
        ));
        header.push_str(&format!(
            "  - Backup: {}\n",
            if settings.backup { "Enabled" } else { "Disabled" }
        ));
        header.push_str(&format!(
            "  - File Types To Include: {}\n",
            settings.filters.include_display()
        ));
        header.push_str(&format!(
            "  - File Types To Exclude: {}\n",
            settings.filters.exclude_display()
        ));
        header.push_str(&format!("{}\n", "-".repeat(RULE_WIDTH)));
        header.push('\n');
        self.decorate(&header)
    }

    /// Writes the run footer.
    pub fn end_run(&self) -> SortResult<()> {
        self.decorate(&format!("\n{}\n\n\n\n\n", "=".repeat(RULE_WIDTH)))
    }

    fn append(&self, text: &str) -> SortResult<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.write_failed(e))?;
        file.write_all(text.as_bytes())
            .map_err(|e| self.write_failed(e))
    }

    fn write_failed(&self, source: std::io::Error) -> SortError {
        SortError::LogWriteFailed {
            path: self.path.clone(),
            source,
        }
    }
}
