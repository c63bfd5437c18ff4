//! Command orchestration for datesort.
//!
//! This module wires the pieces together for one run:
//! - Audit log framing (header and footer)
//! - Classification of the source directory
//! - Moving and backing up files
//! - Console reporting of the outcome

use crate::audit_log::AuditLog;
use crate::classifier::{GroupedFiles, classify};
use crate::config::SortSettings;
use crate::error::SortResult;
use crate::mover::{Mover, RunCounters};
use crate::output::OutputFormatter;
use tracing::info;

/// Represents a CLI command to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Move files into date directories.
    Sort {
        /// Print the counters as JSON instead of a styled summary.
        json: bool,
    },
    /// Show the date grouping without touching any file.
    Preview,
}

/// Runs one sort: writes the log header, classifies, moves and writes the footer.
///
/// The footer is written even when the mover stops on a precondition or I/O
/// error, so each run stays framed in the log.
///
/// # Examples
///
/// ```no_run
/// use datesort::{ExtensionFilter, SortSettings, run_sort};
///
/// let settings = SortSettings::new("/photos/in", "/photos/out", true, ExtensionFilter::default());
/// match run_sort(&settings) {
///     Ok(counters) => println!("moved {} of {}", counters.files_moved, counters.files_found),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run_sort(settings: &SortSettings) -> SortResult<RunCounters> {
    run_sort_with_progress(settings, indicatif::ProgressBar::hidden())
}

fn run_sort_with_progress(
    settings: &SortSettings,
    progress: indicatif::ProgressBar,
) -> SortResult<RunCounters> {
    let log = AuditLog::new(settings.log_file());
    info!(
        source = %settings.source_dir.display(),
        target = %settings.target_dir.display(),
        backup = settings.backup,
        "starting sort run"
    );

    log.begin_run(settings)?;
    let result = match classify(&settings.source_dir, log.path()) {
        Ok(groups) => Mover::new(settings, &log).with_progress(progress).run(&groups),
        Err(e) => {
            log.record_failure(&e);
            Err(e)
        }
    };

    // A failed footer never hides the error that ended the run.
    match (result, log.end_run()) {
        (Err(e), _) => Err(e),
        (Ok(_), Err(footer)) => Err(footer),
        (Ok(counters), Ok(())) => Ok(counters),
    }
}

/// Classifies the source directory without moving anything or writing the log.
pub fn preview(settings: &SortSettings) -> SortResult<GroupedFiles> {
    classify(&settings.source_dir, &settings.log_file())
}

/// Runs `command` and reports the outcome on the console.
///
/// Errors are returned as display strings for the binary to print.
pub fn run_cli(command: Command, settings: &SortSettings) -> Result<RunCounters, String> {
    match command {
        Command::Sort { json } => sort_command(settings, json),
        Command::Preview => preview_command(settings),
    }
}

fn sort_command(settings: &SortSettings, json: bool) -> Result<RunCounters, String> {
    if !json {
        OutputFormatter::info(&format!(
            "Sorting {} into {}",
            settings.source_dir.display(),
            settings.target_dir.display()
        ));
    }

    let progress = if json {
        indicatif::ProgressBar::hidden()
    } else {
        OutputFormatter::create_progress_bar()
    };

    match run_sort_with_progress(settings, progress.clone()) {
        Ok(counters) => {
            progress.finish_and_clear();
            if json {
                let text = serde_json::to_string(&counters)
                    .map_err(|e| format!("JSON serialization failed: {}", e))?;
                OutputFormatter::plain(&text);
            } else {
                OutputFormatter::summary(&counters);
                OutputFormatter::success("Completed.");
                OutputFormatter::plain(&format!(
                    "Log written to {}",
                    settings.log_file().display()
                ));
            }
            Ok(counters)
        }
        Err(e) => {
            progress.abandon();
            if let Some((found, moved)) = e.counters()
                && !json
            {
                OutputFormatter::warning(&format!(
                    "Total Files Found: {}, Total Files Moved: {}",
                    found, moved
                ));
            }
            Err(e.to_string())
        }
    }
}

fn preview_command(settings: &SortSettings) -> Result<RunCounters, String> {
    OutputFormatter::dry_run_notice(&format!(
        "Analyzing contents of: {}",
        settings.source_dir.display()
    ));

    let groups = preview(settings).map_err(|e| e.to_string())?;

    if groups.is_empty() {
        OutputFormatter::warning("No files found to sort.");
        return Ok(RunCounters::default());
    }

    OutputFormatter::plan_table(&groups, &settings.target_dir);

    let overlap = settings.filters.overlap();
    if !overlap.is_empty() {
        OutputFormatter::warning(&format!(
            "Include and exclude lists overlap ({}); a real run would stop here.",
            overlap.join(", ")
        ));
    }

    OutputFormatter::dry_run_notice("No files were modified.");
    Ok(RunCounters {
        files_found: groups.total_files(),
        files_moved: 0,
    })
}
