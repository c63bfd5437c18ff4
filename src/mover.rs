/// Moving classified files into their date directories.
///
/// This module takes the groups produced by the classifier and relocates each
/// file into `<target>/<YYYY_MM_DD>/`, optionally copying it into
/// `<target>/_BACKUP_/` first. Every decision is written to the audit log.
use crate::audit_log::{AuditLog, LogLevel};
use crate::classifier::GroupedFiles;
use crate::config::SortSettings;
use crate::error::{SortError, SortResult};
use indicatif::ProgressBar;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Counts reported back to the caller after a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunCounters {
    /// Every eligible file the classifier found, including skipped ones.
    pub files_found: usize,
    /// Files actually relocated.
    pub files_moved: usize,
}

/// Why a file was left in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// A file with the same name is already in the date directory.
    AlreadyExists,
    /// The include list is non-empty and does not name this extension.
    NotIncluded(String),
    /// The exclude list names this extension.
    Excluded(String),
}

impl SkipReason {
    fn message(&self, file: &str, date_dir: &str) -> String {
        match self {
            SkipReason::AlreadyExists => {
                format!("File '{}' already exists in '{}'.", file, date_dir)
            }
            SkipReason::NotIncluded(ext) => {
                format!("File '{}' excluded ({} not in include list).", file, ext)
            }
            SkipReason::Excluded(ext) => {
                format!("File '{}' excluded ({} in exclude list).", file, ext)
            }
        }
    }
}

/// Lower-cased extension including the dot, or an empty string.
///
/// Leading dots are part of the stem, so `.bashrc` has no extension while
/// `archive.tar.gz` has `.gz`.
pub fn extension_of(file_name: &str) -> String {
    let stem_start = file_name.len() - file_name.trim_start_matches('.').len();
    match file_name.rfind('.') {
        Some(dot) if dot > stem_start => file_name[dot..].to_lowercase(),
        _ => String::new(),
    }
}

fn display_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Moves grouped files into date directories under the target.
pub struct Mover<'a> {
    settings: &'a SortSettings,
    log: &'a AuditLog,
    progress: ProgressBar,
}

impl<'a> Mover<'a> {
    pub fn new(settings: &'a SortSettings, log: &'a AuditLog) -> Self {
        Self {
            settings,
            log,
            progress: ProgressBar::hidden(),
        }
    }

    /// Reports per-file progress on `progress`.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Runs the precondition checks, then moves every file that passes the skip rules.
    ///
    /// # Errors
    ///
    /// Returns `SortError::FilterConflict` or `SortError::NoFiles` before touching the
    /// filesystem. Any I/O failure after that aborts the run; files already moved stay moved.
    pub fn run(&self, groups: &GroupedFiles) -> SortResult<RunCounters> {
        let mut counters = RunCounters {
            files_found: groups.total_files(),
            files_moved: 0,
        };

        self.log
            .decorate(&format!("TOTAL FILES FOUND: {}\n", counters.files_found))?;

        let overlap = self.settings.filters.overlap();
        if !overlap.is_empty() {
            self.log
                .error("Conflict detected between whitelist and blacklist.")?;
            self.log_totals(&counters)?;
            return Err(SortError::FilterConflict {
                overlap,
                files_found: counters.files_found,
            });
        }

        if counters.files_found == 0 {
            self.log.error("No files to move.")?;
            self.log_totals(&counters)?;
            return Err(SortError::NoFiles);
        }

        if let Err(e) = self.move_all(groups, &mut counters) {
            self.log.record_failure(&e);
            if let Err(log_err) = self.log_totals(&counters) {
                debug!(error = %log_err, "could not write totals after failure");
            }
            return Err(e);
        }

        self.log_totals(&counters)?;
        info!(
            found = counters.files_found,
            moved = counters.files_moved,
            "sort run complete"
        );
        Ok(counters)
    }

    /// Creates directories and moves files, counting each relocation as it happens.
    fn move_all(&self, groups: &GroupedFiles, counters: &mut RunCounters) -> SortResult<()> {
        let backup_dir = self.settings.backup_dir();
        if self.settings.backup {
            create_dir(&backup_dir)?;
        }

        self.progress.set_length(counters.files_found as u64);

        for group in groups.iter() {
            let date_name = group.key.to_string();
            let date_dir = self.settings.target_dir.join(&date_name);

            if date_dir.exists() {
                self.log
                    .info(&format!("Using existing directory: {}", date_name))?;
            } else {
                create_dir(&date_dir)?;
                self.log
                    .info(&format!("New directory created: {}", date_name))?;
            }

            for file in &group.files {
                let name = file.to_string_lossy();
                self.progress.set_message(name.to_string());

                let source = self.settings.source_dir.join(file);
                let destination = date_dir.join(file);

                if let Some(reason) = self.skip_reason(&name, &destination) {
                    debug!(file = %name, ?reason, "skipping");
                    self.log.log(
                        LogLevel::Warning,
                        &reason.message(&name, &display_path(&date_dir)),
                        self.settings.backup,
                    )?;
                    self.progress.inc(1);
                    continue;
                }

                if self.settings.backup {
                    let backup_path = backup_dir.join(file);
                    fs::copy(&source, &backup_path).map_err(|e| SortError::BackupFailed {
                        source: source.clone(),
                        destination: backup_path.clone(),
                        source_error: e,
                    })?;
                }

                self.log.log(
                    LogLevel::Moving,
                    &format!("File '{}' to '{}'.", name, display_path(&date_dir)),
                    self.settings.backup,
                )?;
                relocate(&source, &destination)?;
                counters.files_moved += 1;
                self.progress.inc(1);
            }
        }
        Ok(())
    }

    /// Applies the skip rules in order: collision, include list, exclude list.
    fn skip_reason(&self, file_name: &str, destination: &Path) -> Option<SkipReason> {
        if destination.exists() {
            return Some(SkipReason::AlreadyExists);
        }
        let extension = extension_of(file_name);
        if self.settings.filters.include_rejects(&extension) {
            return Some(SkipReason::NotIncluded(extension));
        }
        if self.settings.filters.exclude_rejects(&extension) {
            return Some(SkipReason::Excluded(extension));
        }
        None
    }

    fn log_totals(&self, counters: &RunCounters) -> SortResult<()> {
        self.log.decorate(&format!(
            "TOTAL FILES MOVED: {} of {}\n",
            counters.files_moved, counters.files_found
        ))
    }
}

/// Moves grouped files according to `settings`, logging to `log`.
///
/// # Arguments
///
/// * `groups` - Date groups produced by the classifier
/// * `settings` - Source and target directories, backup flag and extension filters
/// * `log` - Audit log receiving one line per directory and file decision
///
/// # Returns
///
/// Returns the found/moved counters, or the `SortError` that stopped the run.
///
/// # Examples
///
/// ```no_run
/// use datesort::{AuditLog, ExtensionFilter, SortSettings, classify, move_files};
///
/// let settings = SortSettings::new("/photos/in", "/photos/out", false, ExtensionFilter::default());
/// let log = AuditLog::new(settings.log_file());
/// let groups = classify(&settings.source_dir, log.path()).unwrap();
/// let counters = move_files(&groups, &settings, &log).unwrap();
/// println!("moved {} of {}", counters.files_moved, counters.files_found);
/// ```
pub fn move_files(
    groups: &GroupedFiles,
    settings: &SortSettings,
    log: &AuditLog,
) -> SortResult<RunCounters> {
    Mover::new(settings, log).run(groups)
}

fn create_dir(path: &Path) -> SortResult<()> {
    fs::create_dir_all(path).map_err(|e| SortError::DirectoryCreationFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Renames `source` to `destination`, copying and removing when the rename
/// crosses a filesystem boundary.
fn relocate(source: &Path, destination: &Path) -> SortResult<()> {
    let move_failed = |e: std::io::Error| SortError::FileMoveFailure {
        source: source.to_path_buf(),
        destination: destination.to_path_buf(),
        source_error: e,
    };

    match fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::CrossesDevices => {
            fs::copy(source, destination).map_err(move_failed)?;
            fs::remove_file(source).map_err(move_failed)
        }
        Err(e) => Err(move_failed(e)),
    }
}
