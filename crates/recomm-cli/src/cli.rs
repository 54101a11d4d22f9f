//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Recomm CLI - Graph-grounded recommendations for compliance violations.
#[derive(Debug, Parser)]
#[command(name = "recomm")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "RECOMM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Graph database path, overriding the configuration
    #[arg(short, long, global = true, env = "RECOMM_DB")]
    pub database: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (IDs only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load the building model from a data directory
    LoadGraph(LoadGraphArgs),

    /// Load clauses and open violations from the compliance feed
    LoadViolations(LoadViolationsArgs),

    /// Generate recommendations for open violations
    Run(RunArgs),

    /// Show recommendations for a violation or an element
    Show(ShowArgs),

    /// Reject a recommendation
    Reject(RejectArgs),

    /// Reopen a violation whose accepted recommendation was rejected
    Reopen(ReopenArgs),

    /// Write a configuration file with default values
    InitConfig(InitConfigArgs),
}

/// Arguments for the load-graph command.
#[derive(Debug, Parser)]
pub struct LoadGraphArgs {
    /// Directory holding v-*.json and e-*.json files
    pub dir: PathBuf,

    /// Rebuild even when the stored model already matches
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the load-violations command.
#[derive(Debug, Parser)]
pub struct LoadViolationsArgs {
    /// JSON array of violation records
    pub violations: PathBuf,

    /// JSON array of clauses
    #[arg(long)]
    pub clauses: PathBuf,
}

/// Arguments for the run command.
#[derive(Debug, Parser)]
pub struct RunArgs {
    /// Only violations at or above this severity
    #[arg(long, value_enum)]
    pub min_severity: Option<SeverityArg>,

    /// Only violations of this clause
    #[arg(long)]
    pub clause: Option<String>,

    /// Only violations on this element
    #[arg(long)]
    pub element: Option<String>,

    /// Maximum violations to process
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Candidates requested per violation
    #[arg(short, long)]
    pub k: Option<usize>,

    /// Worker count
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Report file, overriding the configuration
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Do not write a report file
    #[arg(long, conflicts_with = "output")]
    pub no_report: bool,
}

/// Arguments for the show command.
#[derive(Debug, Parser)]
#[command(group(clap::ArgGroup::new("subject").required(true).args(["violation", "element"])))]
pub struct ShowArgs {
    /// Violation id
    #[arg(long)]
    pub violation: Option<String>,

    /// Element id
    #[arg(long)]
    pub element: Option<String>,

    /// Include superseded and rejected recommendations
    #[arg(short, long)]
    pub all: bool,
}

/// Arguments for the reject command.
#[derive(Debug, Parser)]
pub struct RejectArgs {
    /// Recommendation id
    pub id: String,

    /// Why the recommendation was rejected
    #[arg(short, long, default_value = "rejected by reviewer")]
    pub reason: String,

    /// Also reopen violations left without an accepted recommendation
    #[arg(long)]
    pub reopen: bool,
}

/// Arguments for the reopen command.
#[derive(Debug, Parser)]
pub struct ReopenArgs {
    /// Violation id
    pub id: String,

    /// Why the violation is reopened
    #[arg(short, long, default_value = "reopened by reviewer")]
    pub reason: String,
}

/// Arguments for the init-config command.
#[derive(Debug, Parser)]
pub struct InitConfigArgs {
    /// Destination file
    #[arg(default_value = crate::config::CONFIG_FILE)]
    pub path: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

/// Severity argument.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum SeverityArg {
    /// Advisory
    Low,
    /// Should be fixed
    Medium,
    /// Must be fixed
    High,
    /// Life safety
    Critical,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}

impl From<SeverityArg> for recomm_domain::Severity {
    fn from(severity: SeverityArg) -> Self {
        match severity {
            SeverityArg::Low => recomm_domain::Severity::Low,
            SeverityArg::Medium => recomm_domain::Severity::Medium,
            SeverityArg::High => recomm_domain::Severity::High,
            SeverityArg::Critical => recomm_domain::Severity::Critical,
        }
    }
}
