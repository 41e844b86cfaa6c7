//! The performance tracker: blends the three prediction layers and picks a
//! mode.
//!
//! The process-wide instance lives behind `OnceLock` and is built lazily on
//! first use; embedders that want telemetry or non-default tuning construct
//! their own tracker and pass it down instead.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use cardbox_core::config::AdaptiveConfig;
use cardbox_core::constants::{
    COMPRESSED_BITMAP_SAFETY, DENSE_BITMAP_SAFETY, TELEMETRY_BLEND_WEIGHT,
};
use cardbox_core::errors::{AdaptiveError, CardboxResult, StorageError};
use cardbox_core::exec::{ExecMetrics, ExecMode, OperationType, QueryShape};

use crate::baseline;
use crate::history::ModeHistory;
use crate::telemetry::{TelemetryCache, TelemetryReporter, TelemetrySource};

/// Process-wide default tracker.
static GLOBAL: OnceLock<Arc<PerfTracker>> = OnceLock::new();

/// Telemetry wiring: the source plus its prediction cache and the
/// fire-and-forget reporter feeding timings back to it.
struct TelemetryLayer {
    source: Arc<dyn TelemetrySource>,
    cache: TelemetryCache,
    reporter: TelemetryReporter,
}

/// Predicts the fastest execution mode for a query shape and learns from
/// the timings reported back after every run.
///
/// Histories are keyed by (mode, operation type) and guarded by one mutex
/// held across a whole predict or record sequence, so concurrent callers
/// cannot interleave half-updated state.
pub struct PerfTracker {
    config: AdaptiveConfig,
    histories: Mutex<HashMap<(ExecMode, OperationType), ModeHistory>>,
    telemetry: Option<TelemetryLayer>,
}

impl PerfTracker {
    /// A tracker with no telemetry layer.
    pub fn new(config: AdaptiveConfig) -> Self {
        Self {
            config,
            histories: Mutex::new(HashMap::new()),
            telemetry: None,
        }
    }

    /// A tracker blending a remote telemetry source into its predictions.
    pub fn with_telemetry(config: AdaptiveConfig, source: Arc<dyn TelemetrySource>) -> Self {
        let cache = TelemetryCache::new(&config);
        let reporter = TelemetryReporter::spawn(source.clone());
        Self {
            config,
            histories: Mutex::new(HashMap::new()),
            telemetry: Some(TelemetryLayer {
                source,
                cache,
                reporter,
            }),
        }
    }

    /// Build a tracker from configuration, wiring up the HTTP telemetry
    /// client when a URL is configured and the `telemetry-http` feature is
    /// compiled in. A URL without the feature is logged and ignored.
    pub fn from_config(config: AdaptiveConfig) -> Arc<Self> {
        #[cfg(feature = "telemetry-http")]
        if let Some(url) = config.telemetry_url.clone() {
            match crate::telemetry::http::HttpTelemetry::new(url) {
                Ok(source) => return Arc::new(Self::with_telemetry(config, source)),
                Err(e) => {
                    tracing::warn!(error = %e, "telemetry client unavailable, continuing local-only")
                }
            }
        }
        #[cfg(not(feature = "telemetry-http"))]
        if config.telemetry_url.is_some() {
            tracing::warn!("telemetry_url configured but the telemetry-http feature is disabled");
        }
        Arc::new(Self::new(config))
    }

    /// The process-wide tracker, constructed on first use with default
    /// configuration.
    pub fn global() -> &'static Arc<PerfTracker> {
        GLOBAL.get_or_init(|| Arc::new(PerfTracker::new(AdaptiveConfig::default())))
    }

    /// Pick the candidate predicted cheapest for `shape`.
    ///
    /// Candidates are considered in declaration order regardless of the
    /// order passed in, and a tie keeps the earlier mode. Fails only on an
    /// empty candidate list; telemetry trouble degrades to local estimates.
    pub fn select_best_mode(
        &self,
        shape: &QueryShape,
        candidates: &[ExecMode],
    ) -> CardboxResult<ExecMode> {
        if candidates.is_empty() {
            return Err(AdaptiveError::NoCandidateModes.into());
        }

        let histories = self
            .histories
            .lock()
            .map_err(|_| StorageError::LockPoisoned {
                what: "performance tracker",
            })?;

        let costs = ExecMode::ALL
            .into_iter()
            .filter(|mode| candidates.contains(mode))
            .map(|mode| (mode, self.predicted_cost(&histories, mode, shape)));
        let mode = cheapest(costs).ok_or(AdaptiveError::NoCandidateModes)?;

        tracing::debug!(
            mode = %mode,
            records = shape.record_count,
            op = %shape.op_type,
            "selected execution mode"
        );
        Ok(mode)
    }

    /// Feed one actual timing back into the history for its (mode,
    /// operation) pair, and forward it to telemetry when configured.
    pub fn record_actual(&self, metrics: &ExecMetrics) -> CardboxResult<()> {
        {
            let mut histories = self
                .histories
                .lock()
                .map_err(|_| StorageError::LockPoisoned {
                    what: "performance tracker",
                })?;
            histories
                .entry((metrics.mode, metrics.shape.op_type))
                .or_insert_with(|| ModeHistory::new(&self.config))
                .record(metrics.shape.record_count, metrics.elapsed_ms);
        }

        if let Some(telemetry) = &self.telemetry {
            telemetry.reporter.enqueue(*metrics);
        }
        Ok(())
    }

    /// Current confidence in the history for a (mode, operation) pair.
    /// Zero until the first observation arrives.
    pub fn confidence(&self, mode: ExecMode, op_type: OperationType) -> CardboxResult<f64> {
        let histories = self
            .histories
            .lock()
            .map_err(|_| StorageError::LockPoisoned {
                what: "performance tracker",
            })?;
        Ok(histories
            .get(&(mode, op_type))
            .map(ModeHistory::confidence)
            .unwrap_or(0.0))
    }

    /// Observations currently windowed for a (mode, operation) pair.
    pub fn history_len(&self, mode: ExecMode, op_type: OperationType) -> CardboxResult<usize> {
        let histories = self
            .histories
            .lock()
            .map_err(|_| StorageError::LockPoisoned {
                what: "performance tracker",
            })?;
        Ok(histories.get(&(mode, op_type)).map_or(0, ModeHistory::len))
    }

    /// The telemetry prediction cache, when a telemetry layer is wired.
    pub fn telemetry_cache(&self) -> Option<&TelemetryCache> {
        self.telemetry.as_ref().map(|t| &t.cache)
    }

    /// Blended cost estimate for one mode, in milliseconds.
    ///
    /// Baseline and history blend by the history's confidence; a remote
    /// prediction then blends over that local estimate; bitmap modes
    /// finally pay their construction safety multiplier.
    fn predicted_cost(
        &self,
        histories: &HashMap<(ExecMode, OperationType), ModeHistory>,
        mode: ExecMode,
        shape: &QueryShape,
    ) -> f64 {
        let baseline = baseline::predict(mode, shape);

        let local = match histories.get(&(mode, shape.op_type)) {
            Some(history) => match history.predict(shape.record_count) {
                Some(fitted) => {
                    let confidence = history.confidence();
                    baseline * (1.0 - confidence) + fitted * confidence
                }
                None => baseline,
            },
            None => baseline,
        };

        let blended = match self.remote_estimate(mode, shape) {
            Some(remote) => {
                TELEMETRY_BLEND_WEIGHT * remote + (1.0 - TELEMETRY_BLEND_WEIGHT) * local
            }
            None => local,
        };

        blended * safety_multiplier(mode)
    }

    /// Cached or freshly fetched remote prediction. Any failure is logged
    /// and treated as "no telemetry".
    fn remote_estimate(&self, mode: ExecMode, shape: &QueryShape) -> Option<f64> {
        let telemetry = self.telemetry.as_ref()?;
        if let Some(cached) = telemetry.cache.get(mode, shape) {
            return Some(cached);
        }
        match telemetry.source.predict(mode, shape) {
            Ok(predicted) => {
                telemetry.cache.insert(mode, shape, predicted);
                Some(predicted)
            }
            Err(e) => {
                tracing::debug!(error = %e, mode = %mode, "telemetry predict failed, using local estimate");
                None
            }
        }
    }
}

/// Construction overhead margin for bitmap modes.
fn safety_multiplier(mode: ExecMode) -> f64 {
    match mode {
        ExecMode::RegularScan | ExecMode::ParallelScan => 1.0,
        ExecMode::DenseBitmap => DENSE_BITMAP_SAFETY,
        ExecMode::CompressedBitmap => COMPRESSED_BITMAP_SAFETY,
    }
}

/// First mode with the strictly lowest cost; a tie keeps the earlier entry.
fn cheapest(costs: impl IntoIterator<Item = (ExecMode, f64)>) -> Option<ExecMode> {
    let mut best: Option<(ExecMode, f64)> = None;
    for (mode, cost) in costs {
        match best {
            Some((_, best_cost)) if cost >= best_cost => {}
            _ => best = Some((mode, cost)),
        }
    }
    best.map(|(mode, _)| mode)
}
