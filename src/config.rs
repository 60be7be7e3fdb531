//! Configuration management for fetch_bench
//!
//! The command line deliberately exposes no knobs for concurrency, output
//! directories or timeouts. Those live in an optional TOML file so the
//! default behaviour (unbounded fan-out, no deadline, fixed directories)
//! stays untouched unless someone opts in.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::app::{BenchConfig, ClientConfig, StrategyKind, StrategyPlan};
use crate::constants::{config as config_files, env, http, output, DEFAULT_LOCATIONS};
use crate::errors::{ConfigError, ConfigResult};

/// Application configuration as stored in TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Batch used when no locations are given on the command line
    pub default_locations: Vec<String>,
    /// Output directory per strategy
    pub output: OutputConfigToml,
    /// Concurrency cap and deadlines
    pub limits: LimitsConfigToml,
    /// HTTP client settings
    pub client: ClientConfigToml,
}

/// TOML-friendly output directory configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfigToml {
    /// Directory for the thread strategy
    pub threads: PathBuf,
    /// Directory for the process strategy
    pub processes: PathBuf,
    /// Directory for the cooperative strategy
    pub cooperative: PathBuf,
}

impl Default for OutputConfigToml {
    fn default() -> Self {
        Self {
            threads: PathBuf::from(output::THREADS),
            processes: PathBuf::from(output::PROCESSES),
            cooperative: PathBuf::from(output::COOPERATIVE),
        }
    }
}

impl OutputConfigToml {
    /// Directory configured for a strategy
    pub fn dir_for(&self, kind: StrategyKind) -> &Path {
        match kind {
            StrategyKind::Threads => &self.threads,
            StrategyKind::Processes => &self.processes,
            StrategyKind::Cooperative => &self.cooperative,
        }
    }
}

/// TOML-friendly limits configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfigToml {
    /// Maximum units in flight per strategy (absent = unbounded)
    pub max_concurrency: Option<usize>,
    /// Total deadline per unit, e.g. "30s" (absent = none)
    #[serde(with = "humantime_serde")]
    pub unit_timeout: Option<Duration>,
    /// Connection deadline per unit, e.g. "5s" (absent = none)
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Option<Duration>,
}

/// TOML-friendly client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfigToml {
    /// User agent sent with every request
    pub user_agent: String,
    /// Maximum idle connections per host
    pub pool_max_per_host: usize,
    /// TCP nodelay setting
    pub tcp_nodelay: bool,
}

impl Default for ClientConfigToml {
    fn default() -> Self {
        Self {
            user_agent: http::USER_AGENT.to_string(),
            pool_max_per_host: http::POOL_MAX_PER_HOST,
            tcp_nodelay: true,
        }
    }
}

impl AppConfig {
    /// Load configuration
    ///
    /// Search order: explicit path, `FETCH_BENCH_CONFIG`, `./fetch-bench.toml`,
    /// then the user config directory. Without any file the defaults apply.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` if an explicitly requested file does
    /// not exist, or a read/parse error for a file that exists but is broken.
    pub fn load(config_file_override: Option<&Path>) -> ConfigResult<Self> {
        let explicit = config_file_override
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(env::CONFIG_PATH).map(PathBuf::from));

        let path = match explicit {
            Some(path) if path.exists() => path,
            Some(path) => return Err(ConfigError::NotFound { path }),
            None => match Self::find_config_file() {
                Some(path) => path,
                None => {
                    debug!("No config file found, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        Self::load_from_file(&path)
    }

    /// Load configuration from a TOML file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&content)?;
        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Parse and validate configuration text
    pub fn from_toml(content: &str) -> ConfigResult<Self> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate values serde cannot check on its own
    pub fn validate(&self) -> ConfigResult<()> {
        if self.limits.max_concurrency == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "limits.max_concurrency".to_string(),
                value: "0".to_string(),
                reason: "Omit the key for unbounded fan-out or use a positive number".to_string(),
            });
        }

        if self.client.user_agent.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "client.user_agent".to_string(),
                value: String::new(),
                reason: "User agent cannot be empty".to_string(),
            });
        }

        for kind in StrategyKind::ALL {
            if self.output.dir_for(kind).as_os_str().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: format!("output.{}", serde_key(kind)),
                    value: String::new(),
                    reason: "Output directory cannot be empty".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Build the driver configuration
    ///
    /// Locations from the command line win over `default_locations`, which win
    /// over the built-in sample list.
    pub fn to_bench_config(&self, cli_locations: Vec<String>) -> BenchConfig {
        let locations = if !cli_locations.is_empty() {
            cli_locations
        } else if !self.default_locations.is_empty() {
            self.default_locations.clone()
        } else {
            DEFAULT_LOCATIONS.iter().map(|s| s.to_string()).collect()
        };

        BenchConfig {
            locations,
            plans: StrategyKind::ALL
                .iter()
                .map(|&kind| StrategyPlan {
                    kind,
                    output_dir: self.output.dir_for(kind).to_path_buf(),
                })
                .collect(),
            client: self.client_config(),
            max_concurrency: self.limits.max_concurrency.and_then(NonZeroUsize::new),
            worker_program: None,
        }
    }

    /// Runtime HTTP client configuration
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            user_agent: self.client.user_agent.clone(),
            unit_timeout: self.limits.unit_timeout,
            connect_timeout: self.limits.connect_timeout,
            pool_max_per_host: self.client.pool_max_per_host,
            tcp_nodelay: self.client.tcp_nodelay,
        }
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let mut search_paths = vec![PathBuf::from(config_files::LOCAL_FILE)];
        if let Some(dir) = dirs::config_dir() {
            search_paths.push(dir.join(config_files::APP_DIR).join(config_files::USER_FILE));
        }

        search_paths.into_iter().find(|path| {
            let found = path.exists();
            if found {
                debug!("Found config file: {}", path.display());
            }
            found
        })
    }
}

fn serde_key(kind: StrategyKind) -> &'static str {
    match kind {
        StrategyKind::Threads => "threads",
        StrategyKind::Processes => "processes",
        StrategyKind::Cooperative => "cooperative",
    }
}
