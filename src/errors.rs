//! Error types for fetch_bench
//!
//! Errors are split by the boundary they are allowed to cross. A [`FetchError`]
//! never leaves its unit of work: it is folded into a
//! [`FetchOutcome`](crate::app::FetchOutcome) and reported. A [`StrategyError`]
//! aborts one strategy and nothing else. [`ConfigError`] and [`AppError`] are
//! only seen by the command-line front end.

use std::error::Error as StdError;
use std::path::PathBuf;

use thiserror::Error;

/// Failures of a single unit of work
#[derive(Error, Debug)]
pub enum FetchError {
    /// No file name can be derived from the location
    #[error("Invalid resource location '{location}': no final path segment")]
    InvalidLocation { location: String },

    /// Remote endpoint answered with a non-success status
    #[error("HTTP {status}")]
    Http { status: u16 },

    /// Connection or protocol level failure
    #[error("{message}")]
    Transport { message: String },

    /// Local write failure
    #[error("Failed to write {path}: {message}")]
    Io { path: PathBuf, message: String },
}

impl FetchError {
    /// Build an I/O error for the given output path
    pub fn io(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: error.to_string(),
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(error: reqwest::Error) -> Self {
        if let Some(status) = error.status() {
            return Self::Http {
                status: status.as_u16(),
            };
        }
        Self::Transport {
            message: error_chain(&error),
        }
    }
}

/// Failures that abort a whole strategy run
#[derive(Error, Debug)]
pub enum StrategyError {
    /// The strategy's output directory could not be created
    #[error("Cannot create output directory {path}: {source}")]
    OutputDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[from] reqwest::Error),

    /// The cooperative scheduler could not be started
    #[error("Failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),

    /// The worker executable for the process strategy could not be located
    #[error("Cannot locate worker executable: {0}")]
    WorkerProgram(#[source] std::io::Error),

    /// Scratch space for worker process results could not be created
    #[error("Failed to create scratch directory for worker results: {0}")]
    Scratch(#[source] std::io::Error),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Configuration file could not be read
    #[error("Failed to read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration format
    #[error("Invalid configuration format: {0}")]
    InvalidFormat(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Top-level application error
#[derive(Error, Debug)]
pub enum AppError {
    /// Strategy error
    #[error(transparent)]
    Strategy(#[from] StrategyError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Result serialization between worker and parent
    #[error("Worker result encoding failed: {0}")]
    Protocol(#[from] serde_json::Error),

    /// Generic application error with context
    #[error("Application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Strategy(_) => "strategy",
            AppError::Config(_) => "config",
            AppError::Protocol(_) => "protocol",
            AppError::Generic { .. } => "generic",
        }
    }
}

/// Render an error together with its source chain on one line
///
/// reqwest's top-level message ("error sending request for url ...") hides
/// the useful part (connection refused, dns failure) in its sources.
pub fn error_chain(error: &dyn StdError) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Unit-of-work result type alias
pub type UnitResult<T> = std::result::Result<T, FetchError>;

/// Strategy result type alias
pub type StrategyResult<T> = std::result::Result<T, StrategyError>;

/// Configuration result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
