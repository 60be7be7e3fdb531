//! Batch start clock
//!
//! Every unit reports its elapsed time relative to the start of its
//! strategy's batch, not relative to its own start. The clock therefore
//! records both a monotonic origin for in-process measurement and a
//! wall-clock timestamp that can be handed to worker processes.

use std::time::{Duration, Instant};

use chrono::{DateTime, SecondsFormat, Utc};

/// Start of a strategy's batch
#[derive(Debug, Clone, Copy)]
pub struct BatchClock {
    started_at: DateTime<Utc>,
    origin: Instant,
}

impl BatchClock {
    /// Start a clock now
    pub fn start() -> Self {
        Self {
            started_at: Utc::now(),
            origin: Instant::now(),
        }
    }

    /// Rebuild a clock from a wall-clock start time recorded elsewhere
    ///
    /// Used by worker processes. A start time in the future (clock skew) is
    /// treated as "now".
    pub fn resume(started_at: DateTime<Utc>) -> Self {
        let behind = Utc::now()
            .signed_duration_since(started_at)
            .to_std()
            .unwrap_or(Duration::ZERO);
        let now = Instant::now();
        Self {
            started_at,
            origin: now.checked_sub(behind).unwrap_or(now),
        }
    }

    /// Wall-clock start time
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Start time in the form passed on a worker's command line
    pub fn to_rfc3339(&self) -> String {
        self.started_at.to_rfc3339_opts(SecondsFormat::Nanos, true)
    }

    /// Time since the batch started
    pub fn elapsed(&self) -> Duration {
        self.origin.elapsed()
    }
}
