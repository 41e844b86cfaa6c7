//! Property tests: mode agreement, subset chains, and identity laws over
//! arbitrary universes.

use proptest::prelude::*;

use cardbox_core::exec::ExecMode;
use cardbox_index::setops::{
    complex_filter, exclusion, execute, intersection, union, BitFilter, UniverseRecord,
};

/// Universes of up to 48 records over a pool of 8 tag values, positions
/// unique by construction.
fn arb_universe() -> impl Strategy<Value = Vec<UniverseRecord>> {
    proptest::collection::vec(proptest::collection::vec(0u32..8, 0..5), 0..48).prop_map(|tag_sets| {
        tag_sets
            .into_iter()
            .enumerate()
            .map(|(i, mut bits)| {
                bits.sort_unstable();
                bits.dedup();
                UniverseRecord::new(i as u32 * 10, bits)
            })
            .collect()
    })
}

fn arb_tags() -> impl Strategy<Value = Vec<u32>> {
    proptest::collection::vec(0u32..8, 0..4)
}

proptest! {
    #[test]
    fn prop_all_modes_agree(
        universe in arb_universe(),
        required in arb_tags(),
        any_of in arb_tags(),
        exclude in arb_tags(),
    ) {
        let filter = BitFilter { required, any_of, exclude };
        let reference = execute(ExecMode::RegularScan, &filter, &universe);
        for mode in ExecMode::ALL {
            prop_assert_eq!(
                execute(mode, &filter, &universe),
                reference.clone(),
                "mode {} diverged",
                mode
            );
        }
    }

    #[test]
    fn prop_intersection_subset_of_union_subset_of_universe(
        universe in arb_universe(),
        tags in proptest::collection::vec(0u32..8, 1..4),
    ) {
        for mode in ExecMode::ALL {
            let inter = intersection(mode, &tags, &universe);
            let un = union(mode, &tags, &universe);
            prop_assert!(inter.iter().all(|p| un.contains(p)));
            prop_assert!(un
                .iter()
                .all(|p| universe.iter().any(|rec| rec.position == *p)));
        }
    }

    #[test]
    fn prop_empty_set_identities(universe in arb_universe()) {
        let mut all: Vec<u32> = universe.iter().map(|r| r.position).collect();
        all.sort_unstable();
        all.dedup();
        for mode in ExecMode::ALL {
            prop_assert_eq!(intersection(mode, &[], &universe), all.clone());
            prop_assert_eq!(union(mode, &[], &universe), Vec::<u32>::new());
            prop_assert_eq!(exclusion(mode, &[], &universe), all.clone());
        }
    }

    #[test]
    fn prop_complex_filter_empty_any_of_equals_intersection(
        universe in arb_universe(),
        required in arb_tags(),
    ) {
        for mode in ExecMode::ALL {
            prop_assert_eq!(
                complex_filter(mode, &required, &[], &universe),
                intersection(mode, &required, &universe)
            );
        }
    }

    #[test]
    fn prop_exclusion_partitions_universe(
        universe in arb_universe(),
        tags in proptest::collection::vec(0u32..8, 1..4),
    ) {
        for mode in ExecMode::ALL {
            let excluded = exclusion(mode, &tags, &universe);
            let unioned = union(mode, &tags, &universe);
            // Every position is in exactly one of the two halves.
            let mut combined = excluded.clone();
            combined.extend(&unioned);
            combined.sort_unstable();
            let mut all: Vec<u32> = universe.iter().map(|r| r.position).collect();
            all.sort_unstable();
            all.dedup();
            prop_assert_eq!(combined, all);
            prop_assert!(excluded.iter().all(|p| !unioned.contains(p)));
        }
    }
}
