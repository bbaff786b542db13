//! Centralized configuration for SQLBridge.
//!
//! This module provides configuration constants for the handle registry, the
//! built-in SQLite driver and logging.

use std::time::Duration;

/// Handle registry configuration.
pub struct RegistryConfig;

impl RegistryConfig {
    /// Cursor value of a fresh registry; the first handle granted is 1.
    pub const INITIAL_CURSOR: u32 = 0;
    pub const INITIAL_CAPACITY: usize = 64;
}

/// Built-in SQLite driver configuration.
pub struct SqliteConfig;

impl SqliteConfig {
    /// Driver names the SQLite driver is registered under.
    pub const DRIVER_NAMES: &'static [&'static str] = &["sqlite", "sqlite3"];
    /// How long a statement waits on a locked database before failing.
    pub const BUSY_TIMEOUT: Duration = Duration::from_millis(5000);
}

/// Logging configuration for embedded hosts.
pub struct LogConfig;

impl LogConfig {
    /// Environment variable holding an `EnvFilter` directive.
    pub const FILTER_ENV: &'static str = "SQLBRIDGE_LOG";
    pub const DEFAULT_FILTER: &'static str = "warn";
    /// Environment variable that switches output to JSON lines when set to `json`.
    pub const FORMAT_ENV: &'static str = "SQLBRIDGE_LOG_FORMAT";
}
