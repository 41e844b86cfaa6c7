//! Fixed linear cost model used before any timing history exists.
//!
//! Costs are in milliseconds: `intercept + slope * record_count +
//! tag_factor * distinct_tag_count`. The table encodes the coarse shape of
//! each mode: scans are cheap to start and expensive per record, bitmap
//! modes pay a setup cost and then scale gently.

use cardbox_core::exec::{ExecMode, QueryShape};

/// Linear cost coefficients for one execution mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeCost {
    /// Fixed setup cost, in milliseconds.
    pub intercept: f64,
    /// Marginal cost per universe record.
    pub slope: f64,
    /// Marginal cost per distinct tag referenced by the filter.
    pub tag_factor: f64,
}

impl ModeCost {
    /// Predicted cost in milliseconds for a query of the given shape.
    pub fn predict(&self, shape: &QueryShape) -> f64 {
        self.intercept
            + self.slope * shape.record_count as f64
            + self.tag_factor * shape.distinct_tag_count as f64
    }
}

/// Baseline coefficients for an execution mode.
pub fn mode_cost(mode: ExecMode) -> ModeCost {
    match mode {
        ExecMode::RegularScan => ModeCost {
            intercept: 0.05,
            slope: 0.000_8,
            tag_factor: 0.002,
        },
        ExecMode::ParallelScan => ModeCost {
            intercept: 0.30,
            slope: 0.000_2,
            tag_factor: 0.002,
        },
        ExecMode::DenseBitmap => ModeCost {
            intercept: 0.12,
            slope: 0.000_05,
            tag_factor: 0.010,
        },
        ExecMode::CompressedBitmap => ModeCost {
            intercept: 0.10,
            slope: 0.000_03,
            tag_factor: 0.015,
        },
    }
}

/// Baseline prediction for `mode` against `shape`, in milliseconds.
pub fn predict(mode: ExecMode, shape: &QueryShape) -> f64 {
    mode_cost(mode).predict(shape)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardbox_core::exec::OperationType;

    fn shape(record_count: usize, distinct_tag_count: usize) -> QueryShape {
        QueryShape {
            record_count,
            distinct_tag_count,
            op_type: OperationType::Intersection,
        }
    }

    #[test]
    fn scans_win_tiny_universes() {
        let small = shape(50, 1);
        let regular = predict(ExecMode::RegularScan, &small);
        for mode in [
            ExecMode::ParallelScan,
            ExecMode::DenseBitmap,
            ExecMode::CompressedBitmap,
        ] {
            assert!(regular < predict(mode, &small));
        }
    }

    #[test]
    fn bitmaps_win_large_universes() {
        let large = shape(100_000, 3);
        let compressed = predict(ExecMode::CompressedBitmap, &large);
        for mode in [ExecMode::RegularScan, ExecMode::ParallelScan] {
            assert!(compressed < predict(mode, &large));
        }
    }

    #[test]
    fn cost_is_linear_in_records() {
        let a = predict(ExecMode::RegularScan, &shape(1_000, 2));
        let b = predict(ExecMode::RegularScan, &shape(2_000, 2));
        let c = predict(ExecMode::RegularScan, &shape(3_000, 2));
        assert!((c - b - (b - a)).abs() < 1e-9);
    }
}
