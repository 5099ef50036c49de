//! TOML-based configuration for csvpivot.
//!
//! Supports a config file (csvpivot.toml) with environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! [worker]
//! path = "${HOME}/bin/pivot-worker"
//! connection_string = ":memory:"
//! timeout_secs = 60
//!
//! [worker.pool]
//! max_open_conns = 1
//!
//! [pivot]
//! preview_limit = 2000
//! max_pivot_cols = 200
//! threads = 4
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::worker::protocol::ConnectionParams;
use crate::worker::DEFAULT_TIMEOUT_SECS;

/// Bounds accepted for `pivot.preview_limit`.
pub const PREVIEW_LIMIT_RANGE: (u64, u64) = (50, 10_000);

/// Bounds accepted for `pivot.max_pivot_cols`.
pub const MAX_PIVOT_COLS_RANGE: (u64, u64) = (10, 1_000);

const WORKER_BINARY: &str = "pivot-worker";

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Engine worker configuration.
    pub worker: WorkerSettings,

    /// Pivot limits and engine hints.
    pub pivot: PivotSettings,
}

/// Worker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkerSettings {
    /// Path to the worker binary (supports ${ENV_VAR} expansion).
    pub path: Option<String>,

    /// Engine driver passed to the worker.
    pub driver: String,

    /// Engine connection string (supports ${ENV_VAR} expansion).
    pub connection_string: String,

    /// Per-query timeout in seconds.
    pub timeout_secs: u64,

    /// Connection pool settings.
    pub pool: PoolSettings,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            path: None,
            driver: "duckdb".to_string(),
            connection_string: ":memory:".to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            pool: PoolSettings::default(),
        }
    }
}

impl WorkerSettings {
    /// Connection parameters with environment variables expanded.
    pub fn connection_params(&self) -> Result<ConnectionParams, SettingsError> {
        Ok(ConnectionParams {
            driver: self.driver.clone(),
            connection_string: expand_env_vars(&self.connection_string)?,
        })
    }
}

/// Connection pool settings forwarded to the worker.
///
/// A session expects one engine connection, so the defaults keep a single
/// open connection.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PoolSettings {
    pub max_idle_conns: u32,
    pub max_open_conns: u32,
    /// Maximum connection lifetime (e.g., "5m", "1h").
    pub conn_max_lifetime: String,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_idle_conns: 1,
            max_open_conns: 1,
            conn_max_lifetime: "1h".to_string(),
        }
    }
}

impl PoolSettings {
    /// Convert to worker command-line arguments.
    pub fn to_worker_args(&self) -> Vec<String> {
        vec![
            "-pool".to_string(),
            format!("-pool-max-idle={}", self.max_idle_conns),
            format!("-pool-max-open={}", self.max_open_conns),
            format!("-pool-conn-lifetime={}", self.conn_max_lifetime),
        ]
    }
}

/// Pivot limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PivotSettings {
    /// Row cap applied to every pivot result.
    pub preview_limit: u64,

    /// Distinct-value ceiling for the wide pivot column dimension.
    pub max_pivot_cols: u64,

    /// Engine thread hint; defaults to half the available cores.
    pub threads: Option<usize>,
}

impl Default for PivotSettings {
    fn default() -> Self {
        Self {
            preview_limit: 2_000,
            max_pivot_cols: 200,
            threads: None,
        }
    }
}

impl PivotSettings {
    /// Thread count to hand the engine at session start.
    pub fn effective_threads(&self) -> usize {
        self.threads.unwrap_or_else(|| {
            let cores = std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4);
            (cores / 2).max(1)
        })
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `CSVPIVOT_CONFIG`
    /// 2. `./csvpivot.toml`
    /// 3. `~/.config/csvpivot/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("CSVPIVOT_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("csvpivot.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("csvpivot").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let (lo, hi) = PREVIEW_LIMIT_RANGE;
        if !(lo..=hi).contains(&self.pivot.preview_limit) {
            return Err(SettingsError::InvalidConfig(format!(
                "pivot.preview_limit must be between {lo} and {hi}, got {}",
                self.pivot.preview_limit
            )));
        }

        let (lo, hi) = MAX_PIVOT_COLS_RANGE;
        if !(lo..=hi).contains(&self.pivot.max_pivot_cols) {
            return Err(SettingsError::InvalidConfig(format!(
                "pivot.max_pivot_cols must be between {lo} and {hi}, got {}",
                self.pivot.max_pivot_cols
            )));
        }

        if self.pivot.threads == Some(0) {
            return Err(SettingsError::InvalidConfig(
                "pivot.threads must be at least 1".to_string(),
            ));
        }

        if self.worker.timeout_secs == 0 {
            return Err(SettingsError::InvalidConfig(
                "worker.timeout_secs must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Locate the worker binary.
    ///
    /// `CSVPIVOT_WORKER` wins over `worker.path`; otherwise a few common
    /// locations and `PATH` are searched.
    pub fn worker_path(&self) -> Option<PathBuf> {
        if let Ok(path) = env::var("CSVPIVOT_WORKER") {
            return Some(PathBuf::from(path));
        }

        if let Some(path) = &self.worker.path {
            let expanded = expand_env_vars(path).ok()?;
            return Some(PathBuf::from(expanded));
        }

        let candidates = [
            format!("./{WORKER_BINARY}"),
            format!("./worker/{WORKER_BINARY}"),
        ];
        for candidate in candidates {
            let path = PathBuf::from(candidate);
            if path.exists() {
                return Some(path);
            }
        }

        if let Ok(output) = std::process::Command::new("which")
            .arg(WORKER_BINARY)
            .output()
        {
            if output.status.success() {
                let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !path.is_empty() {
                    return Some(PathBuf::from(path));
                }
            }
        }

        None
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let mut var_name = String::new();
        if chars.peek() == Some(&'{') {
            chars.next();
            for ch in chars.by_ref() {
                if ch == '}' {
                    break;
                }
                var_name.push(ch);
            }
        } else {
            while let Some(&ch) = chars.peek() {
                if ch.is_alphanumeric() || ch == '_' {
                    var_name.push(ch);
                    chars.next();
                } else {
                    break;
                }
            }
            if var_name.is_empty() {
                // Lone `$`
                result.push('$');
                continue;
            }
        }

        let value =
            env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
