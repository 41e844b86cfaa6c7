//! Compressed mode: roaring bitmaps over the universe's index space.
//!
//! Same clause algebra as the dense mode, but the per-tag sets compress
//! well when memberships are sparse or clustered.

use std::collections::HashMap;

use roaring::RoaringBitmap;

use super::{finalize, BitFilter, UniverseRecord};

pub(super) fn evaluate(filter: &BitFilter, universe: &[UniverseRecord]) -> Vec<u32> {
    let n = universe.len() as u32;

    let mut tag_sets: HashMap<u32, RoaringBitmap> = HashMap::new();
    for &bit in filter
        .required
        .iter()
        .chain(&filter.any_of)
        .chain(&filter.exclude)
    {
        tag_sets.entry(bit).or_insert_with(RoaringBitmap::new);
    }
    for (i, rec) in universe.iter().enumerate() {
        for bit in &rec.tag_bits {
            if let Some(set) = tag_sets.get_mut(bit) {
                set.insert(i as u32);
            }
        }
    }
    let tag_set = |bit: u32| tag_sets.get(&bit).cloned().unwrap_or_default();

    let mut acc = if filter.required.is_empty() {
        let mut all = RoaringBitmap::new();
        all.insert_range(0..n);
        all
    } else {
        let mut acc = tag_set(filter.required[0]);
        for &bit in &filter.required[1..] {
            acc &= tag_set(bit);
            if acc.is_empty() {
                break;
            }
        }
        acc
    };

    if !filter.any_of.is_empty() {
        let mut any = RoaringBitmap::new();
        for &bit in &filter.any_of {
            any |= tag_set(bit);
        }
        acc &= any;
    }

    if !filter.exclude.is_empty() {
        for &bit in &filter.exclude {
            acc -= tag_set(bit);
        }
    }

    let positions = acc.iter().map(|i| universe[i as usize].position).collect();
    finalize(positions)
}
