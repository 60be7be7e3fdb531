//! Command handlers for the fetch_bench CLI
//!
//! These connect parsed arguments and the loaded configuration to the
//! driver, and implement the worker side of the process strategy.

use std::path::Path;
use std::time::Duration;

use tracing::{debug, info};

use crate::app::{
    BatchClock, BenchSummary, BlockingFetcher, ClientConfig, Driver, FetchResult, Reporter,
    ResourceNamer,
};
use crate::cli::{Cli, UnitArgs};
use crate::config::AppConfig;
use crate::errors::{AppError, Result};

/// Handle the default command: run every strategy over the batch
pub fn handle_bench(cli: Cli) -> Result<BenchSummary> {
    let config = AppConfig::load(cli.global.config.as_deref())?;
    let bench = config.to_bench_config(cli.locations);

    info!(
        "Benchmarking {} locations (concurrency limit: {})",
        bench.locations.len(),
        bench
            .max_concurrency
            .map_or_else(|| "unbounded".to_string(), |n| n.to_string())
    );

    Ok(Driver::new(bench, Reporter::stdout()).run())
}

/// Handle `__fetch-unit`: fetch one location in this process
///
/// The unit's console line is printed here, and the structured result is
/// written to the file the parent named. Unit failures are part of the
/// result, so only an unwritable result file is an error.
pub fn handle_unit(args: UnitArgs) -> Result<()> {
    let clock = BatchClock::resume(args.batch_start);
    let namer = ResourceNamer::new(&args.output_dir);
    let client = unit_client_config(&args).build_blocking()?;

    debug!(location = %args.location, pid = std::process::id(), "Worker fetching unit");
    let result = BlockingFetcher::new(client).fetch_unit(&namer, &args.location, &clock);
    Reporter::stdout().unit_finished(&result);

    write_result(&args.result_file, &result)
}

fn unit_client_config(args: &UnitArgs) -> ClientConfig {
    let mut config = ClientConfig {
        unit_timeout: args.timeout_ms.map(Duration::from_millis),
        connect_timeout: args.connect_timeout_ms.map(Duration::from_millis),
        ..ClientConfig::default()
    };
    if let Some(user_agent) = &args.user_agent {
        config.user_agent = user_agent.clone();
    }
    config
}

fn write_result(path: &Path, result: &FetchResult) -> Result<()> {
    let encoded = serde_json::to_vec(result)?;
    std::fs::write(path, encoded).map_err(|e| {
        AppError::generic(format!(
            "Failed to write unit result to {}: {}",
            path.display(),
            e
        ))
    })
}
