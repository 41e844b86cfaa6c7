use serde::{Deserialize, Serialize};

use super::defaults;

/// Adaptive mode-selection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptiveConfig {
    /// Remote telemetry endpoint for blended predictions. None disables
    /// the telemetry layer entirely.
    pub telemetry_url: Option<String>,
    /// TTL for cached telemetry predictions, in seconds.
    pub telemetry_cache_ttl_secs: u64,
    /// Maximum cached telemetry predictions.
    pub telemetry_cache_capacity: u64,
    /// Observations retained per (mode, operation) history.
    pub history_capacity: usize,
    /// Confidence gained per recorded observation.
    pub confidence_step: f64,
    /// Upper bound on history confidence.
    pub confidence_cap: f64,
}

impl Default for AdaptiveConfig {
    fn default() -> Self {
        Self {
            telemetry_url: None,
            telemetry_cache_ttl_secs: defaults::DEFAULT_TELEMETRY_CACHE_TTL_SECS,
            telemetry_cache_capacity: defaults::DEFAULT_TELEMETRY_CACHE_CAPACITY,
            history_capacity: defaults::DEFAULT_HISTORY_CAPACITY,
            confidence_step: defaults::DEFAULT_CONFIDENCE_STEP,
            confidence_cap: defaults::DEFAULT_CONFIDENCE_CAP,
        }
    }
}
