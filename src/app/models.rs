//! Data model shared by every strategy
//!
//! A [`FetchResult`] is produced once per unit of work and consumed
//! immediately by the reporter. A [`StrategyReport`] collects the results of
//! one strategy run in completion order.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::output;
use crate::errors::{FetchError, UnitResult};

/// The concurrency model used to run a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// One OS thread per unit
    Threads,
    /// One OS process per unit
    Processes,
    /// Cooperative tasks on a single-threaded scheduler
    Cooperative,
}

impl StrategyKind {
    /// All strategies in the order the driver runs them
    pub const ALL: [StrategyKind; 3] = [
        StrategyKind::Threads,
        StrategyKind::Processes,
        StrategyKind::Cooperative,
    ];

    /// Human-readable label used in console output
    pub fn label(&self) -> &'static str {
        match self {
            StrategyKind::Threads => "thread pool",
            StrategyKind::Processes => "process pool",
            StrategyKind::Cooperative => "cooperative async",
        }
    }

    /// Fixed output directory name
    pub fn default_dir(&self) -> &'static str {
        match self {
            StrategyKind::Threads => output::THREADS,
            StrategyKind::Processes => output::PROCESSES,
            StrategyKind::Cooperative => output::COOPERATIVE,
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How a single unit of work ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FetchOutcome {
    /// Body written to the output path
    Success { bytes: u64 },
    /// Non-success HTTP status, nothing written
    HttpError { status: u16 },
    /// Connection, protocol or timeout failure
    TransportError { message: String },
    /// Local write failure
    IoError { message: String },
    /// No output name could be derived
    InvalidLocation { message: String },
    /// The worker thread or process died without producing a result
    WorkerLost { message: String },
}

impl FetchOutcome {
    /// Whether the unit succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success { .. })
    }

    /// Short description of a failure, `None` on success
    pub fn failure_reason(&self) -> Option<String> {
        match self {
            FetchOutcome::Success { .. } => None,
            FetchOutcome::HttpError { status } => Some(format!("HTTP {}", status)),
            FetchOutcome::TransportError { message }
            | FetchOutcome::IoError { message }
            | FetchOutcome::InvalidLocation { message }
            | FetchOutcome::WorkerLost { message } => Some(message.clone()),
        }
    }
}

impl From<FetchError> for FetchOutcome {
    fn from(error: FetchError) -> Self {
        match error {
            FetchError::Http { status } => FetchOutcome::HttpError { status },
            FetchError::Transport { message } => FetchOutcome::TransportError { message },
            error @ FetchError::Io { .. } => FetchOutcome::IoError {
                message: error.to_string(),
            },
            error @ FetchError::InvalidLocation { .. } => FetchOutcome::InvalidLocation {
                message: error.to_string(),
            },
        }
    }
}

impl From<UnitResult<u64>> for FetchOutcome {
    fn from(result: UnitResult<u64>) -> Self {
        match result {
            Ok(bytes) => FetchOutcome::Success { bytes },
            Err(error) => error.into(),
        }
    }
}

/// Result of one unit of work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchResult {
    /// The resource location as supplied
    pub location: String,
    /// Derived output path, absent when no name could be derived
    pub output_path: Option<PathBuf>,
    /// Time since the strategy's batch started, not the unit's own latency
    pub elapsed: Duration,
    /// How the unit ended
    pub outcome: FetchOutcome,
}

impl FetchResult {
    /// Whether the unit succeeded
    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }
}

/// Results of one strategy run over the whole batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyReport {
    /// Which strategy produced the report
    pub strategy: StrategyKind,
    /// Per-unit results in completion order
    pub per_item: Vec<FetchResult>,
    /// Wall-clock time from batch start until the last unit finished
    pub total_elapsed: Duration,
}

impl StrategyReport {
    /// Number of units that succeeded
    pub fn succeeded(&self) -> usize {
        self.per_item.iter().filter(|r| r.is_success()).count()
    }

    /// Number of units that failed for any reason
    pub fn failed(&self) -> usize {
        self.per_item.len() - self.succeeded()
    }

    /// Look up the result for a location
    pub fn result_for(&self, location: &str) -> Option<&FetchResult> {
        self.per_item.iter().find(|r| r.location == location)
    }
}
