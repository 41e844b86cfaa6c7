//! Optional remote telemetry layer.
//!
//! A [`TelemetrySource`] can both serve predictions from fleet-wide timing
//! data and receive the timings this process observes. Predictions are
//! cached with a short TTL so a hot query shape asks the network once a
//! minute at most. Reporting runs on a dedicated thread fed by a bounded
//! channel; a slow or dead endpoint drops reports instead of stalling the
//! query path.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use moka::sync::Cache;

use cardbox_core::config::AdaptiveConfig;
use cardbox_core::errors::AdaptiveError;
use cardbox_core::exec::{ExecMetrics, ExecMode, OperationType, QueryShape};

/// Reports queued but not yet delivered before new ones are dropped.
const REPORT_QUEUE_DEPTH: usize = 256;

/// A remote prediction service.
///
/// Both methods may touch the network; callers are expected to wrap
/// `predict` behind [`TelemetryCache`] and `report` behind a
/// [`TelemetryReporter`].
pub trait TelemetrySource: Send + Sync {
    /// Predicted elapsed milliseconds for `mode` against `shape`.
    fn predict(&self, mode: ExecMode, shape: &QueryShape) -> Result<f64, AdaptiveError>;

    /// Push one observed timing upstream.
    fn report(&self, metrics: &ExecMetrics) -> Result<(), AdaptiveError>;
}

/// Cache key: every field that changes the remote prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct TelemetryKey {
    mode: ExecMode,
    record_count: usize,
    distinct_tag_count: usize,
    op_type: OperationType,
}

impl TelemetryKey {
    fn new(mode: ExecMode, shape: &QueryShape) -> Self {
        Self {
            mode,
            record_count: shape.record_count,
            distinct_tag_count: shape.distinct_tag_count,
            op_type: shape.op_type,
        }
    }
}

/// TTL cache over remote predictions, with hit/miss tracking.
pub struct TelemetryCache {
    cache: Cache<TelemetryKey, f64>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl TelemetryCache {
    pub fn new(config: &AdaptiveConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.telemetry_cache_capacity)
            .time_to_live(Duration::from_secs(config.telemetry_cache_ttl_secs))
            .build();
        Self {
            cache,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Cached remote prediction for `mode` against `shape`, if fresh.
    pub fn get(&self, mode: ExecMode, shape: &QueryShape) -> Option<f64> {
        match self.cache.get(&TelemetryKey::new(mode, shape)) {
            Some(v) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(v)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub fn insert(&self, mode: ExecMode, shape: &QueryShape, predicted_ms: f64) {
        self.cache.insert(TelemetryKey::new(mode, shape), predicted_ms);
    }

    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    /// Total cache hits.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Total cache misses.
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

/// Fire-and-forget delivery of observed timings to a telemetry source.
///
/// `try_send` on a bounded channel: when the queue is full the report is
/// dropped and counted, never blocking the caller.
pub struct TelemetryReporter {
    sender: Option<SyncSender<ExecMetrics>>,
    dropped: AtomicU64,
    worker: Option<JoinHandle<()>>,
}

impl TelemetryReporter {
    pub fn spawn(source: Arc<dyn TelemetrySource>) -> Self {
        let (sender, receiver) = mpsc::sync_channel::<ExecMetrics>(REPORT_QUEUE_DEPTH);
        let worker = thread::spawn(move || {
            for metrics in receiver {
                if let Err(e) = source.report(&metrics) {
                    tracing::debug!(error = %e, "telemetry report failed");
                }
            }
        });
        Self {
            sender: Some(sender),
            dropped: AtomicU64::new(0),
            worker: Some(worker),
        }
    }

    /// Queue one timing for delivery. Never blocks.
    pub fn enqueue(&self, metrics: ExecMetrics) {
        let Some(sender) = &self.sender else { return };
        match sender.try_send(metrics) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Reports dropped because the queue was full or the worker gone.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Drop for TelemetryReporter {
    fn drop(&mut self) {
        // Dropping the sender closes the channel and ends the worker loop.
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

#[cfg(feature = "telemetry-http")]
pub mod http {
    //! HTTP telemetry source. POSTs query shapes to `/predict` and observed
    //! timings to `/report`.

    use std::sync::Arc;
    use std::time::Duration;

    use serde::{Deserialize, Serialize};

    use cardbox_core::errors::AdaptiveError;
    use cardbox_core::exec::{ExecMetrics, ExecMode, QueryShape};

    use super::TelemetrySource;

    const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

    #[derive(Serialize)]
    struct PredictRequest<'a> {
        mode: &'a str,
        record_count: usize,
        distinct_tag_count: usize,
        op_type: &'a str,
    }

    #[derive(Deserialize)]
    struct PredictResponse {
        predicted_ms: f64,
    }

    /// Blocking HTTP client for a telemetry endpoint.
    pub struct HttpTelemetry {
        client: reqwest::blocking::Client,
        base_url: String,
    }

    impl HttpTelemetry {
        pub fn new(base_url: impl Into<String>) -> Result<Arc<Self>, AdaptiveError> {
            let client = reqwest::blocking::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .map_err(|e| AdaptiveError::TelemetryFailed {
                    reason: e.to_string(),
                })?;
            Ok(Arc::new(Self {
                client,
                base_url: base_url.into(),
            }))
        }

        fn post<Req: Serialize, Resp: serde::de::DeserializeOwned>(
            &self,
            path: &str,
            body: &Req,
        ) -> Result<Resp, AdaptiveError> {
            let url = format!("{}{}", self.base_url, path);
            self.client
                .post(&url)
                .json(body)
                .send()
                .and_then(|r| r.error_for_status())
                .and_then(|r| r.json::<Resp>())
                .map_err(|e| AdaptiveError::TelemetryFailed {
                    reason: e.to_string(),
                })
        }
    }

    impl TelemetrySource for HttpTelemetry {
        fn predict(&self, mode: ExecMode, shape: &QueryShape) -> Result<f64, AdaptiveError> {
            let request = PredictRequest {
                mode: mode.as_str(),
                record_count: shape.record_count,
                distinct_tag_count: shape.distinct_tag_count,
                op_type: shape.op_type.as_str(),
            };
            let response: PredictResponse = self.post("/predict", &request)?;
            Ok(response.predicted_ms)
        }

        fn report(&self, metrics: &ExecMetrics) -> Result<(), AdaptiveError> {
            let _: serde_json::Value = self.post("/report", metrics)?;
            Ok(())
        }
    }
}
