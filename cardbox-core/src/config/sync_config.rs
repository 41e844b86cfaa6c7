use serde::{Deserialize, Serialize};

use super::defaults;

/// Remote mirroring configuration.
///
/// With `enabled = false` the factory opens a local-only store and the
/// rest of this section is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Mirror local writes to a remote endpoint.
    pub enabled: bool,
    /// Remote mirror base URL.
    pub remote_url: Option<String>,
    /// Seconds between queue drain sweeps.
    pub drain_interval_secs: u64,
    /// Maximum queue entries pushed per sweep.
    pub batch_size: usize,
    /// Attempts before a queue entry is parked as failed.
    pub max_attempts: u32,
    /// First retry delay in milliseconds.
    pub initial_backoff_ms: u64,
    /// Retry delay ceiling in milliseconds.
    pub max_backoff_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: defaults::DEFAULT_SYNC_ENABLED,
            remote_url: None,
            drain_interval_secs: defaults::DEFAULT_DRAIN_INTERVAL_SECS,
            batch_size: defaults::DEFAULT_SYNC_BATCH_SIZE,
            max_attempts: defaults::DEFAULT_MAX_SYNC_ATTEMPTS,
            initial_backoff_ms: defaults::DEFAULT_INITIAL_BACKOFF_MS,
            max_backoff_ms: defaults::DEFAULT_MAX_BACKOFF_MS,
        }
    }
}
