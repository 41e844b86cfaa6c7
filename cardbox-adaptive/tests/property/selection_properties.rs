//! Property tests: selection totality and determinism, confidence
//! monotonicity under arbitrary feedback.

use proptest::prelude::*;

use cardbox_adaptive::PerfTracker;
use cardbox_core::config::AdaptiveConfig;
use cardbox_core::exec::{ExecMetrics, ExecMode, OperationType, QueryShape};

fn arb_op_type() -> impl Strategy<Value = OperationType> {
    prop::sample::select(OperationType::ALL.to_vec())
}

fn arb_shape() -> impl Strategy<Value = QueryShape> {
    (0usize..1_000_000, 0usize..64, arb_op_type()).prop_map(|(record_count, distinct_tag_count, op_type)| {
        QueryShape {
            record_count,
            distinct_tag_count,
            op_type,
        }
    })
}

fn arb_candidates() -> impl Strategy<Value = Vec<ExecMode>> {
    prop::sample::subsequence(ExecMode::ALL.to_vec(), 1..=ExecMode::COUNT)
        .prop_shuffle()
}

fn arb_metrics() -> impl Strategy<Value = ExecMetrics> {
    (
        prop::sample::select(ExecMode::ALL.to_vec()),
        arb_shape(),
        0.0f64..500.0,
    )
        .prop_map(|(mode, shape, elapsed_ms)| ExecMetrics {
            mode,
            shape,
            elapsed_ms,
        })
}

proptest! {
    #[test]
    fn prop_selection_returns_a_listed_candidate(
        shape in arb_shape(),
        candidates in arb_candidates()
    ) {
        let tracker = PerfTracker::new(AdaptiveConfig::default());
        let picked = tracker.select_best_mode(&shape, &candidates).unwrap();
        prop_assert!(candidates.contains(&picked));
    }

    #[test]
    fn prop_selection_ignores_candidate_order(
        shape in arb_shape(),
        candidates in arb_candidates()
    ) {
        let tracker = PerfTracker::new(AdaptiveConfig::default());
        let mut reversed = candidates.clone();
        reversed.reverse();
        prop_assert_eq!(
            tracker.select_best_mode(&shape, &candidates).unwrap(),
            tracker.select_best_mode(&shape, &reversed).unwrap()
        );
    }

    #[test]
    fn prop_feedback_never_breaks_selection(
        shape in arb_shape(),
        feedback in prop::collection::vec(arb_metrics(), 0..60)
    ) {
        let tracker = PerfTracker::new(AdaptiveConfig::default());
        for metrics in &feedback {
            tracker.record_actual(metrics).unwrap();
        }
        let picked = tracker.select_best_mode(&shape, &ExecMode::ALL).unwrap();
        prop_assert!(ExecMode::ALL.contains(&picked));
    }

    #[test]
    fn prop_confidence_is_monotone_and_capped(
        feedback in prop::collection::vec(arb_metrics(), 1..120)
    ) {
        let config = AdaptiveConfig::default();
        let tracker = PerfTracker::new(config.clone());
        let mut floor = std::collections::HashMap::new();

        for metrics in &feedback {
            let key = (metrics.mode, metrics.shape.op_type);
            tracker.record_actual(metrics).unwrap();
            let confidence = tracker.confidence(key.0, key.1).unwrap();
            let previous = floor.insert(key, confidence).unwrap_or(0.0);
            prop_assert!(confidence >= previous);
            prop_assert!(confidence <= config.confidence_cap + 1e-12);
        }
    }
}
