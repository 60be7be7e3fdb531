//! Scheduling strategies for a batch of units
//!
//! Each strategy is a thin adapter that decides *how* units are scheduled;
//! *what* a unit does lives in [`crate::app::client::download`]. The shared
//! lifecycle (header, clock, output directory, join-all, summary) is
//! [`run_strategy`].
//!
//! - `threads`: one OS thread per unit
//! - `processes`: one OS process per unit
//! - `cooperative`: one task per unit on a single-threaded async scheduler
//!
//! With `max_concurrency = None` every strategy fans out all units at once.
//! `Some(k)` caps the number of units in flight.

use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::debug;

use crate::app::clock::BatchClock;
use crate::app::models::{FetchOutcome, FetchResult, StrategyKind, StrategyReport};
use crate::app::naming::ResourceNamer;
use crate::app::reporter::Reporter;
use crate::errors::{StrategyError, StrategyResult};

pub mod cooperative;
pub mod processes;
pub mod threads;

pub use cooperative::CooperativeRunner;
pub use processes::ProcessPoolRunner;
pub use threads::ThreadPoolRunner;

/// Everything a runner needs to execute one batch
#[derive(Debug, Clone, Copy)]
pub struct Batch<'a> {
    /// Locations in the order supplied
    pub locations: &'a [String],
    /// Output naming for this strategy's directory
    pub namer: &'a ResourceNamer,
    /// Batch start, shared by every unit
    pub clock: BatchClock,
    /// Console reporter
    pub reporter: &'a Reporter,
}

/// A scheduling model for running every unit of a batch
pub trait StrategyRunner {
    /// Which strategy this runner implements
    fn kind(&self) -> StrategyKind;

    /// Runs every unit and returns their results in completion order
    ///
    /// Implementations must return exactly one result per location and must
    /// not return before every unit has finished. Unit failures are results,
    /// not errors; an `Err` means the strategy could not run at all.
    fn run_batch(&self, batch: Batch<'_>) -> StrategyResult<Vec<FetchResult>>;
}

/// Runs one strategy end to end
///
/// # Errors
///
/// Returns `StrategyError` when the output directory cannot be created or the
/// runner cannot start. No unit runs in that case.
pub fn run_strategy(
    runner: &dyn StrategyRunner,
    locations: &[String],
    output_dir: &Path,
    reporter: &Reporter,
) -> StrategyResult<StrategyReport> {
    let strategy = runner.kind();
    reporter.strategy_started(strategy);

    let clock = BatchClock::start();

    std::fs::create_dir_all(output_dir).map_err(|source| StrategyError::OutputDirectory {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let namer = ResourceNamer::new(output_dir);
    let per_item = runner.run_batch(Batch {
        locations,
        namer: &namer,
        clock,
        reporter,
    })?;

    let report = StrategyReport {
        strategy,
        per_item,
        total_elapsed: clock.elapsed(),
    };
    reporter.strategy_finished(&report);
    Ok(report)
}

/// Number of workers to start for `units` units under an optional cap
pub fn worker_count(max_concurrency: Option<NonZeroUsize>, units: usize) -> usize {
    match max_concurrency {
        Some(limit) => limit.get().min(units),
        None => units,
    }
}

/// Lock-free hand-out of locations to worker threads
#[derive(Debug)]
pub(crate) struct UnitQueue<'a> {
    locations: &'a [String],
    next: AtomicUsize,
}

impl<'a> UnitQueue<'a> {
    pub(crate) fn new(locations: &'a [String]) -> Self {
        Self {
            locations,
            next: AtomicUsize::new(0),
        }
    }

    /// Claims the next unit, returning its index and location
    pub(crate) fn claim(&self) -> Option<(usize, &'a str)> {
        let index = self.next.fetch_add(1, Ordering::Relaxed);
        self.locations
            .get(index)
            .map(|location| (index, location.as_str()))
    }
}

/// Result for a unit whose worker died before producing one
pub(crate) fn worker_lost(batch: &Batch<'_>, location: &str, message: String) -> FetchResult {
    FetchResult {
        location: location.to_string(),
        output_path: batch.namer.name_for(location).ok(),
        elapsed: batch.clock.elapsed(),
        outcome: FetchOutcome::WorkerLost { message },
    }
}

/// Runs a unit, turning a panic into a `WorkerLost` result
pub(crate) fn run_isolated<F>(batch: &Batch<'_>, location: &str, unit: F) -> FetchResult
where
    F: FnOnce() -> FetchResult,
{
    match panic::catch_unwind(AssertUnwindSafe(unit)) {
        Ok(result) => result,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            debug!(location, %message, "Unit panicked");
            worker_lost(batch, location, format!("Worker panicked: {}", message))
        }
    }
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "unknown panic".to_string()
    }
}
