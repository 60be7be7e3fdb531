//! fetch_bench library
//!
//! Downloads one batch of resources three times, once per concurrency
//! strategy (thread pool, process pool, cooperative async), and reports how
//! long each unit and each strategy took.

pub mod app;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};
