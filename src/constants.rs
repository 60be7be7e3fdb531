//! Application constants for fetch_bench
//!
//! This module centralizes the constants used throughout the application,
//! organized by functional domain.

/// Environment variable names
pub mod env {
    /// Environment variable pointing at an explicit configuration file
    pub const CONFIG_PATH: &str = "FETCH_BENCH_CONFIG";
}

/// Built-in batch used when neither the command line nor the config file
/// supplies any locations
pub mod defaults {
    /// Four sample image locations
    pub const LOCATIONS: [&str; 4] = [
        "https://mykaleidoscope.ru/x/uploads/posts/2022-10/1666364979_14-mykaleidoscope-ru-p-krasivie-peizazhi-prirodi-oboi-17.jpg",
        "https://mykaleidoscope.ru/x/uploads/posts/2022-10/1666365039_2-mykaleidoscope-ru-p-krasivie-peizazhi-prirodi-oboi-4.jpg",
        "https://gas-kvas.com/uploads/posts/2023-02/1675483689_gas-kvas-com-p-fonovii-risunok-dlya-kompyutera-priroda-15.jpg",
        "https://catherineasquithgallery.com/uploads/posts/2021-03/1614612233_137-p-fon-dlya-fotoshopa-priroda-209.jpg",
    ];
}

/// Fixed output directories, one per strategy
pub mod output {
    /// Output directory for the thread-per-item strategy
    pub const THREADS: &str = "threading_downloaded";

    /// Output directory for the process-per-item strategy
    pub const PROCESSES: &str = "multiprocessing_downloaded";

    /// Output directory for the cooperative async strategy
    pub const COOPERATIVE: &str = "async_downloaded";
}

/// HTTP client configuration constants
pub mod http {
    /// Default user agent for all HTTP requests
    pub const USER_AGENT: &str = concat!("fetch_bench/", env!("CARGO_PKG_VERSION"));

    /// Maximum idle connections kept per host in the shared pool
    pub const POOL_MAX_PER_HOST: usize = 25;
}

/// File operation constants
pub mod files {
    /// Read buffer size for blocking body streaming (8KB)
    pub const DOWNLOAD_CHUNK_SIZE: usize = 8 * 1024;

    /// Prefix of the scratch directory holding worker process results
    pub const SCRATCH_PREFIX: &str = "fetch-bench-";

    /// Extension of per-unit result files written by worker processes
    pub const RESULT_FILE_EXTENSION: &str = "json";
}

/// Configuration file discovery
pub mod config {
    /// Project-local config file name
    pub const LOCAL_FILE: &str = "fetch-bench.toml";

    /// Directory name under the user config directory
    pub const APP_DIR: &str = "fetch-bench";

    /// Config file name under the user config directory
    pub const USER_FILE: &str = "config.toml";
}

/// Worker process protocol
pub mod worker {
    /// Hidden subcommand that runs exactly one unit of work
    pub const UNIT_SUBCOMMAND: &str = "__fetch-unit";
}

// Re-export commonly used constants for convenience
pub use defaults::LOCATIONS as DEFAULT_LOCATIONS;
pub use http::USER_AGENT;
pub use worker::UNIT_SUBCOMMAND;
