//! Rolling per-(mode, operation) timing history with a least-squares fit.

use std::collections::VecDeque;

use cardbox_core::config::AdaptiveConfig;

/// Fewer observations than this and the fit is not worth trusting at all;
/// a single point cannot anchor a slope.
const MIN_FIT_POINTS: usize = 2;

/// One recorded timing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    /// Universe size the operation ran against.
    pub record_count: usize,
    /// Wall-clock time it took.
    pub elapsed_ms: f64,
}

/// Bounded rolling history of actual timings for one (mode, operation) pair.
///
/// Keeps the most recent observations, fits `record_count -> elapsed_ms` by
/// least squares, and tracks how much that fit should be trusted. Confidence
/// only ever rises; stale observations age out of the window but their
/// accumulated trust does not decay.
#[derive(Debug, Clone)]
pub struct ModeHistory {
    observations: VecDeque<Observation>,
    capacity: usize,
    confidence: f64,
    confidence_step: f64,
    confidence_cap: f64,
}

impl ModeHistory {
    pub fn new(config: &AdaptiveConfig) -> Self {
        Self {
            observations: VecDeque::with_capacity(config.history_capacity),
            capacity: config.history_capacity,
            confidence: 0.0,
            confidence_step: config.confidence_step,
            confidence_cap: config.confidence_cap,
        }
    }

    /// Record one actual timing, evicting the oldest observation once the
    /// window is full, and bump confidence toward the cap.
    pub fn record(&mut self, record_count: usize, elapsed_ms: f64) {
        self.observations.push_back(Observation {
            record_count,
            elapsed_ms,
        });
        while self.observations.len() > self.capacity {
            self.observations.pop_front();
        }
        self.confidence = (self.confidence + self.confidence_step).min(self.confidence_cap);
    }

    /// Weight the blend should give this history over the baseline.
    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Least-squares prediction of elapsed milliseconds at `record_count`.
    ///
    /// Returns `None` below [`MIN_FIT_POINTS`]. When every observation sits
    /// at the same record count the slope is undefined and the mean elapsed
    /// time is used instead. Extrapolation is clamped at zero.
    pub fn predict(&self, record_count: usize) -> Option<f64> {
        let n = self.observations.len();
        if n < MIN_FIT_POINTS {
            return None;
        }

        let n = n as f64;
        let mean_x = self
            .observations
            .iter()
            .map(|o| o.record_count as f64)
            .sum::<f64>()
            / n;
        let mean_y = self.observations.iter().map(|o| o.elapsed_ms).sum::<f64>() / n;

        let mut variance = 0.0;
        let mut covariance = 0.0;
        for obs in &self.observations {
            let dx = obs.record_count as f64 - mean_x;
            variance += dx * dx;
            covariance += dx * (obs.elapsed_ms - mean_y);
        }

        let predicted = if variance < f64::EPSILON {
            mean_y
        } else {
            let slope = covariance / variance;
            mean_y + slope * (record_count as f64 - mean_x)
        };

        Some(predicted.max(0.0))
    }
}
