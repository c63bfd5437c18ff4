use clap::Parser;
use datesort::cli::{Command, run_cli};
use datesort::config::{ConfigFile, SettingsOverrides};
use datesort::output::OutputFormatter;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;

/// Move files into YYYY_MM_DD directories by filename date or modification time.
#[derive(Parser)]
#[command(name = "datesort", version)]
struct Cli {
    /// Directory whose files are sorted (direct children only)
    source: Option<PathBuf>,

    /// Directory that receives the date directories and log.txt
    target: Option<PathBuf>,

    /// Copy each file into <TARGET>/_BACKUP_ before moving it
    #[arg(short, long)]
    backup: bool,

    /// Comma-separated extensions to include (empty means all)
    #[arg(short, long, value_name = "LIST")]
    include: Option<String>,

    /// Comma-separated extensions to exclude
    #[arg(short, long, value_name = "LIST")]
    exclude: Option<String>,

    /// Configuration file (defaults to .datesortrc.toml or ~/.config/datesort/config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Show the date grouping without moving anything
    #[arg(long)]
    dry_run: bool,

    /// Print the counters as JSON
    #[arg(long, conflicts_with = "dry_run")]
    json: bool,

    /// Enable debug diagnostics on stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let file = match ConfigFile::load(cli.config.as_deref()) {
        Ok(file) => file,
        Err(e) => {
            OutputFormatter::error(&format!("Error loading configuration: {}", e));
            return ExitCode::FAILURE;
        }
    };

    let overrides = SettingsOverrides {
        source: cli.source,
        target: cli.target,
        backup: cli.backup,
        include: cli.include,
        exclude: cli.exclude,
    };
    let settings = match overrides.resolve(file) {
        Ok(settings) => settings,
        Err(e) => {
            OutputFormatter::error(&format!("Error: {}", e));
            return ExitCode::FAILURE;
        }
    };

    let command = if cli.dry_run {
        Command::Preview
    } else {
        Command::Sort { json: cli.json }
    };

    match run_cli(command, &settings) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            OutputFormatter::error(&format!("Error: {}", e));
            ExitCode::FAILURE
        }
    }
}
