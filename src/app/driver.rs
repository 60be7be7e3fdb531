//! Benchmark driver
//!
//! Runs the configured strategies one after another over the same batch, each
//! into its own output directory. Strategies never overlap. A strategy that
//! cannot start is reported and skipped; the remaining strategies still run.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use tracing::info;

use super::client::ClientConfig;
use super::models::{StrategyKind, StrategyReport};
use super::reporter::Reporter;
use super::strategy::{
    run_strategy, CooperativeRunner, ProcessPoolRunner, StrategyRunner, ThreadPoolRunner,
};
use crate::constants::DEFAULT_LOCATIONS;
use crate::errors::{error_chain, StrategyError, StrategyResult};

/// One strategy to run and where it writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyPlan {
    /// Which strategy
    pub kind: StrategyKind,
    /// Its output directory
    pub output_dir: PathBuf,
}

impl StrategyPlan {
    /// Plan using the strategy's fixed directory name under `root`
    pub fn under(root: &Path, kind: StrategyKind) -> Self {
        Self {
            kind,
            output_dir: root.join(kind.default_dir()),
        }
    }
}

/// Everything the driver needs, passed in explicitly
#[derive(Debug, Clone)]
pub struct BenchConfig {
    /// The batch, in the order supplied
    pub locations: Vec<String>,
    /// Strategies to run, in order
    pub plans: Vec<StrategyPlan>,
    /// HTTP client settings shared by every strategy
    pub client: ClientConfig,
    /// Cap on units in flight per strategy, `None` for unbounded fan-out
    pub max_concurrency: Option<NonZeroUsize>,
    /// Worker executable for the process strategy, defaults to this executable
    pub worker_program: Option<PathBuf>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self::new(DEFAULT_LOCATIONS.iter().map(|s| s.to_string()).collect())
    }
}

impl BenchConfig {
    /// All three strategies over `locations`, writing to the fixed directories
    /// in the current working directory
    pub fn new(locations: Vec<String>) -> Self {
        Self {
            locations,
            plans: StrategyKind::ALL
                .iter()
                .map(|&kind| StrategyPlan::under(Path::new(""), kind))
                .collect(),
            client: ClientConfig::default(),
            max_concurrency: None,
            worker_program: None,
        }
    }

    /// Relocate every strategy's fixed directory under `root`
    pub fn with_output_root(mut self, root: &Path) -> Self {
        for plan in &mut self.plans {
            plan.output_dir = root.join(plan.kind.default_dir());
        }
        self
    }

    /// Run only the given strategies, in the given order
    pub fn with_strategies(mut self, root: &Path, kinds: &[StrategyKind]) -> Self {
        self.plans = kinds
            .iter()
            .map(|&kind| StrategyPlan::under(root, kind))
            .collect();
        self
    }

    /// Set the cap on units in flight
    pub fn with_max_concurrency(mut self, limit: Option<NonZeroUsize>) -> Self {
        self.max_concurrency = limit;
        self
    }

    /// Set the worker executable used by the process strategy
    pub fn with_worker_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.worker_program = Some(program.into());
        self
    }
}

/// A strategy that could not run
#[derive(Debug, Clone)]
pub struct AbortedStrategy {
    /// Which strategy
    pub kind: StrategyKind,
    /// Why it could not run
    pub reason: String,
}

/// Outcome of a full driver run
#[derive(Debug, Clone, Default)]
pub struct BenchSummary {
    /// Reports of strategies that ran, in run order
    pub reports: Vec<StrategyReport>,
    /// Strategies that were aborted before any unit ran
    pub aborted: Vec<AbortedStrategy>,
}

impl BenchSummary {
    /// Whether every planned strategy ran
    pub fn all_ran(&self) -> bool {
        self.aborted.is_empty()
    }

    /// Report of a strategy, if it ran
    pub fn report(&self, kind: StrategyKind) -> Option<&StrategyReport> {
        self.reports.iter().find(|r| r.strategy == kind)
    }
}

/// Runs strategies sequentially over one batch
#[derive(Debug)]
pub struct Driver {
    config: BenchConfig,
    reporter: Reporter,
}

impl Driver {
    /// Create a driver
    pub fn new(config: BenchConfig, reporter: Reporter) -> Self {
        Self { config, reporter }
    }

    /// The configuration in use
    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    /// Run every planned strategy to completion
    pub fn run(&self) -> BenchSummary {
        info!(
            "Running {} strategies over {} locations",
            self.config.plans.len(),
            self.config.locations.len()
        );

        let mut summary = BenchSummary::default();
        for plan in &self.config.plans {
            match self.run_plan(plan) {
                Ok(report) => summary.reports.push(report),
                Err(e) => {
                    let reason = error_chain(&e);
                    self.reporter.strategy_aborted(plan.kind, &reason);
                    summary.aborted.push(AbortedStrategy {
                        kind: plan.kind,
                        reason,
                    });
                }
            }
        }
        summary
    }

    fn run_plan(&self, plan: &StrategyPlan) -> StrategyResult<StrategyReport> {
        let runner = self.runner_for(plan.kind)?;
        run_strategy(
            runner.as_ref(),
            &self.config.locations,
            &plan.output_dir,
            &self.reporter,
        )
    }

    fn runner_for(&self, kind: StrategyKind) -> StrategyResult<Box<dyn StrategyRunner>> {
        let client = self.config.client.clone();
        let limit = self.config.max_concurrency;
        Ok(match kind {
            StrategyKind::Threads => Box::new(ThreadPoolRunner::new(client, limit)),
            StrategyKind::Processes => {
                let program = match &self.config.worker_program {
                    Some(program) => program.clone(),
                    None => std::env::current_exe().map_err(StrategyError::WorkerProgram)?,
                };
                Box::new(ProcessPoolRunner::new(program, client, limit))
            }
            StrategyKind::Cooperative => Box::new(CooperativeRunner::new(client, limit)),
        })
    }
}
