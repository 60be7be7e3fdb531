//! Process-per-unit strategy
//!
//! Each unit runs in a fresh worker process (`<program> __fetch-unit ...`).
//! Nothing is shared in memory: the child builds its own client, derives its
//! own output path, prints its own report line to the inherited stdout and
//! hands its structured result back as a JSON file in a scratch directory
//! owned by the parent. A child that dies without writing that file is
//! recorded as `WorkerLost` and reported by the parent.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::thread;

use tracing::{debug, warn};

use super::{worker_count, worker_lost, Batch, StrategyRunner, UnitQueue};
use crate::app::client::ClientConfig;
use crate::app::models::{FetchResult, StrategyKind};
use crate::constants::{files, UNIT_SUBCOMMAND};
use crate::errors::{StrategyError, StrategyResult};

/// Runs every unit in its own OS process
#[derive(Debug, Clone)]
pub struct ProcessPoolRunner {
    program: PathBuf,
    client: ClientConfig,
    max_concurrency: Option<NonZeroUsize>,
}

impl ProcessPoolRunner {
    /// Create a runner that launches `program` as the worker executable
    pub fn new(
        program: impl Into<PathBuf>,
        client: ClientConfig,
        max_concurrency: Option<NonZeroUsize>,
    ) -> Self {
        Self {
            program: program.into(),
            client,
            max_concurrency,
        }
    }

    /// Worker executable
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Build the worker command line for one unit
    fn command(&self, batch: &Batch<'_>, location: &str, result_file: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command
            .arg(UNIT_SUBCOMMAND)
            .arg("--output-dir")
            .arg(batch.namer.output_dir())
            .arg("--batch-start")
            .arg(batch.clock.to_rfc3339())
            .arg("--result-file")
            .arg(result_file)
            .arg("--user-agent")
            .arg(&self.client.user_agent);

        if let Some(timeout) = self.client.unit_timeout {
            command.arg("--timeout-ms").arg(timeout.as_millis().to_string());
        }
        if let Some(timeout) = self.client.connect_timeout {
            command
                .arg("--connect-timeout-ms")
                .arg(timeout.as_millis().to_string());
        }

        command
            .arg("--")
            .arg(location)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        command
    }

    /// Launch one worker and wait for it
    fn run_unit(&self, batch: &Batch<'_>, location: &str, result_file: &Path) -> FetchResult {
        let mut child = match self.command(batch, location, result_file).spawn() {
            Ok(child) => child,
            Err(e) => {
                return self.lost(
                    batch,
                    location,
                    format!("Failed to start worker process {}: {}", self.program.display(), e),
                )
            }
        };
        debug!(pid = child.id(), location, "Worker process started");

        let status = match child.wait() {
            Ok(status) => status,
            Err(e) => {
                return self.lost(batch, location, format!("Failed to wait for worker process: {}", e))
            }
        };

        match read_result(result_file) {
            Ok(result) => result,
            Err(reason) => self.lost(batch, location, describe_exit(status, &reason)),
        }
    }

    /// Build and report a result for a unit whose worker gave none back
    fn lost(&self, batch: &Batch<'_>, location: &str, message: String) -> FetchResult {
        warn!(location, %message, "Worker process lost");
        let result = worker_lost(batch, location, message);
        batch.reporter.unit_finished(&result);
        result
    }
}

impl StrategyRunner for ProcessPoolRunner {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Processes
    }

    fn run_batch(&self, batch: Batch<'_>) -> StrategyResult<Vec<FetchResult>> {
        if batch.locations.is_empty() {
            return Ok(Vec::new());
        }

        let scratch = tempfile::Builder::new()
            .prefix(files::SCRATCH_PREFIX)
            .tempdir()
            .map_err(StrategyError::Scratch)?;
        let queue = UnitQueue::new(batch.locations);
        let launchers = worker_count(self.max_concurrency, batch.locations.len());
        debug!(
            "Starting {} launcher threads for {} worker processes",
            launchers,
            batch.locations.len()
        );

        let mut results = thread::scope(|scope| {
            let (tx, rx) = mpsc::channel();

            for launcher_id in 0..launchers {
                let tx = tx.clone();
                let queue = &queue;
                let scratch = scratch.path();
                let spawned = thread::Builder::new()
                    .name(format!("fetch-launcher-{}", launcher_id))
                    .spawn_scoped(scope, move || {
                        while let Some((index, location)) = queue.claim() {
                            let result_file = scratch.join(format!(
                                "unit-{}.{}",
                                index,
                                files::RESULT_FILE_EXTENSION
                            ));
                            let result = self.run_unit(&batch, location, &result_file);
                            if tx.send(result).is_err() {
                                break;
                            }
                        }
                    });

                if let Err(e) = spawned {
                    warn!("Failed to start launcher thread {}: {}", launcher_id, e);
                }
            }
            drop(tx);

            rx.iter().collect::<Vec<FetchResult>>()
        });

        while let Some((_, location)) = queue.claim() {
            results.push(self.lost(&batch, location, "No launcher thread available".to_string()));
        }

        if let Err(e) = scratch.close() {
            debug!("Failed to remove worker scratch directory: {}", e);
        }

        Ok(results)
    }
}

fn read_result(path: &Path) -> Result<FetchResult, String> {
    let content = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    serde_json::from_str(&content).map_err(|e| format!("malformed result: {}", e))
}

fn describe_exit(status: ExitStatus, reason: &str) -> String {
    match status.code() {
        Some(code) => format!(
            "Worker process exited with code {} without a result ({})",
            code, reason
        ),
        None => format!(
            "Worker process terminated by signal without a result ({})",
            reason
        ),
    }
}
