//! HTTP retrieval for a single unit of work
//!
//! The module is organized into:
//! - `config`: client settings and construction of blocking/async clients
//! - `download`: the fetch-and-persist unit shared by all strategies

pub mod config;
pub mod download;

pub use config::ClientConfig;
pub use download::{AsyncFetcher, BlockingFetcher};
