//! HTTP client configuration and building logic
//!
//! Both the blocking client (thread and process strategies) and the async
//! client (cooperative strategy) are built from the same settings so the
//! strategies differ only in scheduling.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::http;
use crate::errors::StrategyResult;

/// Configuration shared by the blocking and async HTTP clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// User agent sent with every request
    pub user_agent: String,
    /// Total deadline per request, `None` waits indefinitely
    pub unit_timeout: Option<Duration>,
    /// Connection establishment deadline, `None` waits indefinitely
    pub connect_timeout: Option<Duration>,
    /// Maximum idle connections kept per host
    pub pool_max_per_host: usize,
    /// TCP nodelay (disable Nagle's algorithm)
    pub tcp_nodelay: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: http::USER_AGENT.to_string(),
            unit_timeout: None,
            connect_timeout: None,
            pool_max_per_host: http::POOL_MAX_PER_HOST,
            tcp_nodelay: true,
        }
    }
}

impl ClientConfig {
    /// Set the per-request deadline
    pub fn with_unit_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.unit_timeout = timeout;
        self
    }

    /// Builds the blocking client used by thread and process workers
    ///
    /// Must not be called from inside an async runtime.
    pub fn build_blocking(&self) -> StrategyResult<reqwest::blocking::Client> {
        // reqwest's blocking client defaults to a 30s timeout; pass ours through
        // explicitly so `None` really means no deadline
        let mut builder = reqwest::blocking::Client::builder()
            .user_agent(self.user_agent.as_str())
            .timeout(self.unit_timeout)
            .tcp_nodelay(self.tcp_nodelay)
            .pool_max_idle_per_host(self.pool_max_per_host);

        if let Some(connect_timeout) = self.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }

        Ok(builder.build()?)
    }

    /// Builds the async client shared by every cooperative task
    pub fn build_async(&self) -> StrategyResult<reqwest::Client> {
        let mut builder = reqwest::Client::builder()
            .user_agent(self.user_agent.as_str())
            .tcp_nodelay(self.tcp_nodelay)
            .pool_max_idle_per_host(self.pool_max_per_host);

        if let Some(timeout) = self.unit_timeout {
            builder = builder.timeout(timeout);
        }

        if let Some(connect_timeout) = self.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }

        Ok(builder.build()?)
    }
}
