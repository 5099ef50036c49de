//! Configuration module for csvpivot.
//!
//! Handles the TOML settings file and environment variable expansion.

mod settings;

pub use settings::{
    expand_env_vars, PivotSettings, PoolSettings, Settings, SettingsError, WorkerSettings,
    MAX_PIVOT_COLS_RANGE, PREVIEW_LIMIT_RANGE,
};
