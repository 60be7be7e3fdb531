//! Command-line argument parsing for fetch_bench
//!
//! The public surface is just an optional list of locations. The hidden
//! `__fetch-unit` subcommand is how the process strategy runs one unit in a
//! child process; it is not meant to be typed by hand.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};

/// fetch_bench - Compare thread, process and async fan-out on one batch
#[derive(Parser, Debug)]
#[command(
    name = "fetch_bench",
    version,
    about = "Download the same batch of files with three concurrency strategies and time each",
    long_about = "Downloads every location with a thread pool, a process pool and a cooperative
async scheduler in turn, writing each strategy's files to its own directory and printing
per-file and total wall-clock times.",
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Locations to download (defaults to the configured or built-in batch)
    #[arg(value_name = "LOCATIONS")]
    pub locations: Vec<String>,

    /// Internal subcommands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Global arguments
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (debug level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - only errors are logged
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Internal commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch a single location on behalf of the process strategy
    #[command(name = "__fetch-unit", hide = true)]
    Unit(UnitArgs),
}

/// Arguments for one unit of work in a worker process
#[derive(Args, Debug, Clone)]
pub struct UnitArgs {
    /// Directory the file is written to
    #[arg(long, value_name = "DIR")]
    pub output_dir: PathBuf,

    /// Batch start instant (RFC 3339) elapsed time is measured from
    #[arg(long, value_name = "TIMESTAMP")]
    pub batch_start: DateTime<Utc>,

    /// Where the structured result is written for the parent
    #[arg(long, value_name = "FILE")]
    pub result_file: PathBuf,

    /// Total deadline for the unit in milliseconds
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Connection deadline in milliseconds
    #[arg(long, value_name = "MS")]
    pub connect_timeout_ms: Option<u64>,

    /// User agent sent with the request
    #[arg(long)]
    pub user_agent: Option<String>,

    /// The location to fetch
    #[arg(value_name = "LOCATION", allow_hyphen_values = true)]
    pub location: String,
}

impl Cli {
    /// Parse command line arguments without exiting on failure
    pub fn try_parse_args() -> Result<Self, clap::Error> {
        Self::try_parse()
    }

    /// Get the logging level based on global arguments
    pub fn log_level(&self) -> tracing::Level {
        if self.global.quiet {
            tracing::Level::ERROR
        } else if self.global.very_verbose {
            tracing::Level::DEBUG
        } else if self.global.verbose {
            tracing::Level::INFO
        } else {
            tracing::Level::WARN
        }
    }
}
