//! # cardbox-adaptive
//!
//! Adaptive execution-mode selection for tag filter queries. Predicts which
//! of the four execution modes will be fastest for a given query shape and
//! learns from actual timings fed back after every run.
//!
//! ## 3 Prediction Layers
//!
//! | Layer | Source | Weight |
//! |-------|--------|--------|
//! | Baseline | Fixed linear cost model per mode | `1 - confidence` |
//! | History | Least-squares fit over the last 20 observations per (mode, operation) | `confidence`, grows +0.02/observation, capped at 0.8 |
//! | Telemetry | Optional remote prediction service, cached 60 s | 0.7 over the local blend |
//!
//! Bitmap modes carry a fixed safety multiplier (dense ×1.10, compressed
//! ×1.05) covering construction overhead the linear model does not see.
//! Ties go to the earlier mode in declaration order.

pub mod baseline;
pub mod history;
pub mod telemetry;
pub mod tracker;

pub use baseline::ModeCost;
pub use history::ModeHistory;
pub use telemetry::{TelemetryCache, TelemetryReporter, TelemetrySource};
pub use tracker::PerfTracker;
