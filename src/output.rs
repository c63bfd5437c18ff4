//! Output formatting and styling module.
//!
//! Provides a centralized interface for all console output: colored status
//! lines, the progress bar shown while files are moved, the run summary and the
//! dry-run plan table.

use crate::classifier::GroupedFiles;
use crate::mover::RunCounters;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;

/// Manages all CLI output with consistent styling and formatting.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// ```no_run
    /// use datesort::output::OutputFormatter;
    /// OutputFormatter::success("Completed.");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Creates a progress bar for the move loop. Its length is set by the mover.
    pub fn create_progress_bar() -> ProgressBar {
        let pb = ProgressBar::new(0);
        if let Ok(style) =
            ProgressStyle::default_bar().template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("█▓░"));
        }
        pb
    }

    /// Prints the found/moved totals of a finished run.
    pub fn summary(counters: &RunCounters) {
        Self::header("SUMMARY");
        println!(
            "{:<12} | {}",
            "Files found".bold(),
            counters.files_found.to_string().green()
        );
        println!(
            "{:<12} | {}",
            "Files moved".bold(),
            counters.files_moved.to_string().green().bold()
        );
        let skipped = counters.files_found - counters.files_moved;
        if skipped > 0 {
            println!("{:<12} | {}", "Skipped".bold(), skipped.to_string().yellow());
        }
    }

    /// Prints where each file would go, one section per date directory.
    pub fn plan_table(groups: &GroupedFiles, target_dir: &Path) {
        Self::header("PLAN");
        for group in groups.iter() {
            let dir = target_dir.join(group.key.to_string());
            let file_word = if group.files.len() == 1 { "file" } else { "files" };
            println!(
                "{} ({} {})",
                dir.display().to_string().bold(),
                group.files.len(),
                file_word
            );
            for name in group.file_names() {
                println!("  - {}", name);
            }
        }
        println!("{}", "-".repeat(40));
        println!(
            "{} | {} {}",
            "Total".bold(),
            groups.total_files().to_string().green().bold(),
            if groups.total_files() == 1 { "file" } else { "files" }
        );
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }
}
