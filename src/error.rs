//! Errors raised while classifying and moving files.
//!
//! Precondition failures (`FilterConflict`, `NoFiles`) are detected before the
//! filesystem is touched. Every other variant wraps an I/O failure that aborted
//! the run at the point it happened; files moved before that point stay moved.

use std::path::PathBuf;

/// Errors that can occur during a sort run.
#[derive(Debug)]
pub enum SortError {
    /// The include and exclude extension lists share at least one entry.
    FilterConflict {
        /// Extensions present in both lists.
        overlap: Vec<String>,
        /// Number of eligible files that were found before the run stopped.
        files_found: usize,
    },
    /// The source directory holds no eligible files.
    NoFiles,
    /// The source directory could not be listed.
    SourceUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Metadata (file type or modification time) could not be read for an entry.
    MetadataFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to create a date or backup directory.
    DirectoryCreationFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to copy a file into the backup directory.
    BackupFailed {
        source: PathBuf,
        destination: PathBuf,
        source_error: std::io::Error,
    },
    /// Failed to move a file into its date directory.
    FileMoveFailure {
        source: PathBuf,
        destination: PathBuf,
        source_error: std::io::Error,
    },
    /// Failed to append to the audit log.
    LogWriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl SortError {
    /// Returns the `(found, moved)` pair a caller should display for this error,
    /// if the error was raised by a precondition check.
    pub fn counters(&self) -> Option<(usize, usize)> {
        match self {
            Self::FilterConflict { files_found, .. } => Some((*files_found, 0)),
            Self::NoFiles => Some((0, 0)),
            _ => None,
        }
    }
}

impl std::fmt::Display for SortError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FilterConflict { overlap, .. } => {
                write!(
                    f,
                    "Conflict detected between whitelist and blacklist: {}",
                    overlap.join(", ")
                )
            }
            Self::NoFiles => write!(f, "No files to move."),
            Self::SourceUnreadable { path, source } => {
                write!(f, "Error reading directory {}: {}", path.display(), source)
            }
            Self::MetadataFailed { path, source } => {
                write!(f, "Failed to read metadata for {}: {}", path.display(), source)
            }
            Self::DirectoryCreationFailed { path, source } => {
                write!(
                    f,
                    "Failed to create directory {}: {}",
                    path.display(),
                    source
                )
            }
            Self::BackupFailed {
                source,
                destination,
                source_error,
            } => {
                write!(
                    f,
                    "Failed to back up {} to {}: {}",
                    source.display(),
                    destination.display(),
                    source_error
                )
            }
            Self::FileMoveFailure {
                source,
                destination,
                source_error,
            } => {
                write!(
                    f,
                    "Failed to move {} to {}: {}",
                    source.display(),
                    destination.display(),
                    source_error
                )
            }
            Self::LogWriteFailed { path, source } => {
                write!(f, "Failed to write log file {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for SortError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::SourceUnreadable { source, .. }
            | Self::MetadataFailed { source, .. }
            | Self::DirectoryCreationFailed { source, .. }
            | Self::LogWriteFailed { source, .. } => Some(source),
            Self::BackupFailed { source_error, .. } | Self::FileMoveFailure { source_error, .. } => {
                Some(source_error)
            }
            Self::FilterConflict { .. } | Self::NoFiles => None,
        }
    }
}

/// Result type for sort operations.
pub type SortResult<T> = Result<T, SortError>;
