use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "pan-dbedit")]
#[command(about = "Apply dbedit CSV changesets to PAN-OS firewall and Panorama configurations")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Apply a changeset to a device configuration.
    Apply(ApplyArgs),
    /// Parse and syntax-check a changeset without a device.
    Check(CheckArgs),
    /// Write the live objects of a configuration as a changeset.
    Export(ExportArgs),
}

#[derive(Parser, Debug)]
pub struct ApplyArgs {
    /// Device configuration file (firewall or Panorama).
    pub config: PathBuf,
    /// Changeset CSV.
    #[arg(long)]
    pub changes: PathBuf,
    /// Device group, vsys or virtual router to process, or ALL.
    #[arg(long)]
    pub location: Option<String>,
    /// Skip syntax and reference checks.
    #[arg(long)]
    pub no_checks: bool,
    /// Do not take the config and commit locks.
    #[arg(long)]
    pub no_locks: bool,
    /// Validate and read only; mutations are logged and skipped.
    #[arg(long, conflicts_with = "commit")]
    pub test: bool,
    /// Commit when every operation succeeded, revert otherwise.
    #[arg(long)]
    pub commit: bool,
    /// Where a commit persists the running configuration, or where an
    /// uncommitted candidate is saved.
    #[arg(long)]
    pub output: Option<PathBuf>,
    /// Also write the run summary as JSON.
    #[arg(long)]
    pub summary_json: Option<PathBuf>,
    /// Settings TOML file.
    #[arg(long)]
    pub settings: Option<PathBuf>,
    /// Do not write the per-run log file.
    #[arg(long)]
    pub no_log_file: bool,
    /// Show the run details and ask for confirmation before applying.
    #[arg(short, long)]
    pub interactive: bool,
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,
    #[arg(short, long)]
    pub quiet: bool,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Changeset CSV.
    #[arg(long)]
    pub changes: PathBuf,
    /// Skip syntax checks; only type coercions apply.
    #[arg(long)]
    pub no_checks: bool,
    /// Fail when any row was skipped.
    #[arg(long)]
    pub strict: bool,
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,
    #[arg(short, long)]
    pub quiet: bool,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Parser, Debug)]
pub struct ExportArgs {
    /// Device configuration file (firewall or Panorama).
    pub config: PathBuf,
    /// Changeset CSV to write.
    #[arg(long)]
    pub output: PathBuf,
    /// Device group, vsys or virtual router to export, or ALL.
    #[arg(long)]
    pub location: Option<String>,
    /// Settings TOML file.
    #[arg(long)]
    pub settings: Option<PathBuf>,
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
