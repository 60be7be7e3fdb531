//! Console reporting
//!
//! Lines are written whole under a lock so concurrent units never interleave
//! mid-line. The same formatting is used by worker processes, which write to
//! their inherited stdout.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use super::models::{FetchResult, StrategyKind, StrategyReport};

/// Shared, line-atomic console writer
#[derive(Clone)]
pub struct Reporter {
    sink: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl std::fmt::Debug for Reporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reporter").finish_non_exhaustive()
    }
}

impl Reporter {
    /// Reporter writing to standard output
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    /// Reporter writing to an arbitrary sink
    pub fn new(sink: impl Write + Send + 'static) -> Self {
        Self {
            sink: Arc::new(Mutex::new(Box::new(sink))),
        }
    }

    /// Announce a strategy before its units start
    pub fn strategy_started(&self, strategy: StrategyKind) {
        info!("Starting {} strategy", strategy);
        self.emit(&format_strategy_header(strategy));
    }

    /// Report one finished unit
    pub fn unit_finished(&self, result: &FetchResult) {
        match result.outcome.failure_reason() {
            None => debug!(
                location = %result.location,
                elapsed_ms = result.elapsed.as_millis() as u64,
                "Unit completed"
            ),
            Some(reason) => warn!(location = %result.location, %reason, "Unit failed"),
        }
        self.emit(&format_unit_line(result));
    }

    /// Report a strategy's aggregate time
    pub fn strategy_finished(&self, report: &StrategyReport) {
        info!(
            strategy = %report.strategy,
            units = report.per_item.len(),
            failed = report.failed(),
            "Strategy finished in {:?}",
            report.total_elapsed
        );
        self.emit(&format_summary_line(report));
    }

    /// Report a strategy that could not run
    pub fn strategy_aborted(&self, strategy: StrategyKind, reason: &str) {
        tracing::error!(%strategy, %reason, "Strategy aborted");
        self.emit(&format_aborted_line(strategy, reason));
    }

    fn emit(&self, line: &str) {
        let mut sink = self.sink.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let written = writeln!(sink, "{}", line).and_then(|()| sink.flush());
        if let Err(e) = written {
            debug!("Failed to write report line: {}", e);
        }
    }
}

/// `<Label> strategy:`
pub fn format_strategy_header(strategy: StrategyKind) -> String {
    let label = strategy.label();
    let mut chars = label.chars();
    let capitalized = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
        None => String::new(),
    };
    format!("{} strategy:", capitalized)
}

/// One line per finished unit
pub fn format_unit_line(result: &FetchResult) -> String {
    let seconds = result.elapsed.as_secs_f64();
    match (result.outcome.failure_reason(), &result.output_path) {
        (None, Some(path)) => format!(
            "{} -> {}, load time: {:.2}",
            result.location,
            path.display(),
            seconds
        ),
        (None, None) => format!("{}, load time: {:.2}", result.location, seconds),
        (Some(reason), _) => format!(
            "Error downloading {}: {}, load time: {:.2}",
            result.location, reason, seconds
        ),
    }
}

/// Aggregate line printed once a strategy finished
pub fn format_summary_line(report: &StrategyReport) -> String {
    format!(
        "Total time for {} strategy: {:.2}s ({} succeeded, {} failed)",
        report.strategy,
        report.total_elapsed.as_secs_f64(),
        report.succeeded(),
        report.failed()
    )
}

/// Line printed when a strategy could not run at all
pub fn format_aborted_line(strategy: StrategyKind, reason: &str) -> String {
    format!("Strategy {} aborted: {}", strategy, reason)
}
