//! Tracing subscriber setup for binaries and ad-hoc diagnostics.
//!
//! Library code only emits through the `tracing` macros; installing a
//! subscriber is the embedding application's call. `init` honours
//! `RUST_LOG` when set and falls back to the configured level otherwise.

use tracing_subscriber::EnvFilter;

use crate::config::defaults::DEFAULT_LOG_LEVEL;

/// Install a global fmt subscriber. Safe to call more than once; later
/// calls are no-ops.
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// `init` with the default level.
pub fn init_default() {
    init(DEFAULT_LOG_LEVEL);
}
