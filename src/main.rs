//! fetch_bench CLI application
//!
//! Runs the thread, process and cooperative async strategies over one batch
//! of locations and prints per-unit and per-strategy timings.

use std::process;

use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use fetch_bench::cli::{handle_bench, handle_unit, Cli, Commands};
use fetch_bench::errors::Result;

fn main() {
    let code = match run() {
        Ok(code) => code,
        Err(e) => {
            error!(category = e.category(), "{}", e);
            eprintln!("Error: {}", e);
            1
        }
    };
    process::exit(code);
}

/// Main application logic, returning the process exit code
fn run() -> Result<i32> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    let mut cli = match Cli::try_parse_args() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version are reported through the same error path
            let _ = e.print();
            return Ok(if e.use_stderr() { 1 } else { 0 });
        }
    };
    init_logging(&cli);

    match cli.command.take() {
        Some(Commands::Unit(args)) => {
            handle_unit(args)?;
            Ok(0)
        }
        None => {
            info!("fetch_bench v{} starting", env!("CARGO_PKG_VERSION"));
            let summary = handle_bench(cli)?;
            Ok(if summary.all_ran() { 0 } else { 1 })
        }
    }
}

/// Initialize logging based on CLI verbosity settings
///
/// Logs go to stderr so stdout carries only the benchmark report.
fn init_logging(cli: &Cli) {
    let log_level = cli.log_level();

    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = format!("fetch_bench={}", log_level).parse() {
        filter = filter.add_directive(directive);
    }

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(cli.global.very_verbose)
        .init();

    if cli.global.very_verbose {
        info!("Very verbose logging enabled");
    } else if cli.global.verbose {
        info!("Verbose logging enabled");
    }
}
