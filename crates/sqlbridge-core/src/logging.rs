//! Logging setup for hosts that load the bridge as a native library.
//!
//! The bridge only emits `tracing` events. A host that already installed a
//! subscriber keeps it; otherwise [`init`] installs a stderr fmt subscriber
//! filtered by `SQLBRIDGE_LOG`.

use crate::config::LogConfig;
use tracing_subscriber::EnvFilter;

/// Install the default subscriber. Safe to call more than once.
///
/// Returns `false` if a global subscriber was already set.
pub fn init() -> bool {
    let filter = EnvFilter::try_from_env(LogConfig::FILTER_ENV)
        .unwrap_or_else(|_| EnvFilter::new(LogConfig::DEFAULT_FILTER));

    let json = std::env::var(LogConfig::FORMAT_ENV)
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let installed = if json {
        builder.json().try_init()
    } else {
        builder.compact().try_init()
    };
    installed.is_ok()
}
