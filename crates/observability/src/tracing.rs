//! Tracing/logging initialization.
//!
//! JSON lines on stdout, filtered by `RUST_LOG`. Without `RUST_LOG` the
//! default is `info` for everything, which includes one line per admin
//! detection and per token exchange.

use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "info";

/// Initialize tracing with [`DEFAULT_FILTER`] as the fallback filter.
pub fn init() {
    init_with_default(DEFAULT_FILTER);
}

/// Initialize tracing; `default_filter` applies when `RUST_LOG` is unset or
/// unparsable.
///
/// Returns `false` when a global subscriber was already installed.
pub fn init_with_default(default_filter: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init()
        .is_ok()
}
