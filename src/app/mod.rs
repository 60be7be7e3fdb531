//! Core application logic for fetch_bench
//!
//! This module contains the unit of work (naming, retrieval, persistence),
//! the three scheduling strategies that run it over a batch, the console
//! reporter and the driver that runs the strategies in sequence.
//!
//! # Examples
//!
//! ```rust,no_run
//! use fetch_bench::app::{BenchConfig, Driver, Reporter};
//!
//! let config = BenchConfig::new(vec![
//!     "https://example.com/images/image1.jpg".to_string(),
//!     "https://example.com/images/image2.jpg".to_string(),
//! ]);
//!
//! let summary = Driver::new(config, Reporter::stdout()).run();
//! for report in &summary.reports {
//!     println!("{}: {:?}", report.strategy, report.total_elapsed);
//! }
//! ```

pub mod client;
pub mod clock;
pub mod driver;
pub mod models;
pub mod naming;
pub mod reporter;
pub mod strategy;

// Re-export main public API
pub use client::{AsyncFetcher, BlockingFetcher, ClientConfig};
pub use clock::BatchClock;
pub use driver::{AbortedStrategy, BenchConfig, BenchSummary, Driver, StrategyPlan};
pub use models::{FetchOutcome, FetchResult, StrategyKind, StrategyReport};
pub use naming::ResourceNamer;
pub use reporter::Reporter;
pub use strategy::{
    run_strategy, Batch, CooperativeRunner, ProcessPoolRunner, StrategyRunner, ThreadPoolRunner,
};
