//! Scan modes: predicate evaluation per record, sequential or rayon.

use rayon::prelude::*;

use super::{finalize, matches, BitFilter, UniverseRecord};

pub(super) fn sequential(filter: &BitFilter, universe: &[UniverseRecord]) -> Vec<u32> {
    let positions = universe
        .iter()
        .filter(|rec| matches(filter, &rec.tag_bits))
        .map(|rec| rec.position)
        .collect();
    finalize(positions)
}

pub(super) fn parallel(filter: &BitFilter, universe: &[UniverseRecord]) -> Vec<u32> {
    let positions = universe
        .par_iter()
        .filter(|rec| matches(filter, &rec.tag_bits))
        .map(|rec| rec.position)
        .collect();
    finalize(positions)
}
