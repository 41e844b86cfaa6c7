//! Dense mode: fixed `u64` word bitsets over the universe's index space.
//!
//! One pass builds a bitset per referenced tag, then the clauses combine
//! with word-wide AND/OR/ANDNOT. Pays off when the filter touches few
//! tags on a large universe.

use std::collections::HashMap;

use super::{finalize, BitFilter, UniverseRecord};

pub(super) fn evaluate(filter: &BitFilter, universe: &[UniverseRecord]) -> Vec<u32> {
    let n = universe.len();
    let words = n.div_ceil(64);
    let zero = vec![0u64; words];

    // Bitsets only for tags the filter actually references.
    let mut tag_sets: HashMap<u32, Vec<u64>> = HashMap::new();
    for &bit in filter
        .required
        .iter()
        .chain(&filter.any_of)
        .chain(&filter.exclude)
    {
        tag_sets.entry(bit).or_insert_with(|| zero.clone());
    }
    for (i, rec) in universe.iter().enumerate() {
        for bit in &rec.tag_bits {
            if let Some(set) = tag_sets.get_mut(bit) {
                set[i / 64] |= 1 << (i % 64);
            }
        }
    }

    let mut acc = if filter.required.is_empty() {
        all_ones(n, words)
    } else {
        let mut acc = tag_set(&tag_sets, &zero, filter.required[0]).to_vec();
        for &bit in &filter.required[1..] {
            and_assign(&mut acc, tag_set(&tag_sets, &zero, bit));
        }
        acc
    };

    if !filter.any_of.is_empty() {
        let mut any = zero.clone();
        for &bit in &filter.any_of {
            or_assign(&mut any, tag_set(&tag_sets, &zero, bit));
        }
        and_assign(&mut acc, &any);
    }

    if !filter.exclude.is_empty() {
        let mut excl = zero.clone();
        for &bit in &filter.exclude {
            or_assign(&mut excl, tag_set(&tag_sets, &zero, bit));
        }
        and_not_assign(&mut acc, &excl);
    }

    let mut positions = Vec::new();
    for (w, &word) in acc.iter().enumerate() {
        let mut remaining = word;
        while remaining != 0 {
            let b = remaining.trailing_zeros() as usize;
            positions.push(universe[w * 64 + b].position);
            remaining &= remaining - 1;
        }
    }
    finalize(positions)
}

fn tag_set<'a>(sets: &'a HashMap<u32, Vec<u64>>, zero: &'a [u64], bit: u32) -> &'a [u64] {
    sets.get(&bit).map(Vec::as_slice).unwrap_or(zero)
}

fn all_ones(n: usize, words: usize) -> Vec<u64> {
    let mut set = vec![u64::MAX; words];
    let tail = n % 64;
    if tail != 0 {
        if let Some(last) = set.last_mut() {
            *last = (1u64 << tail) - 1;
        }
    }
    set
}

fn and_assign(acc: &mut [u64], other: &[u64]) {
    for (a, b) in acc.iter_mut().zip(other) {
        *a &= b;
    }
}

fn or_assign(acc: &mut [u64], other: &[u64]) {
    for (a, b) in acc.iter_mut().zip(other) {
        *a |= b;
    }
}

fn and_not_assign(acc: &mut [u64], other: &[u64]) {
    for (a, b) in acc.iter_mut().zip(other) {
        *a &= !b;
    }
}
