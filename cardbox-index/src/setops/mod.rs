//! Pure set operations over tag membership facts.
//!
//! Every operation takes an explicit universe (one record per card, each
//! carrying its bitmap position and tag bitmap values) and returns the
//! matching positions in ascending order, deduplicated. The four
//! execution modes are interchangeable: same inputs, same output, only
//! the evaluation strategy differs.
//!
//! Empty-set semantics are asymmetric by contract:
//! - [`intersection`] with no tags is the identity (everything matches),
//! - [`union`] with no tags matches nothing,
//! - [`complex_filter`] skips its any-of phase entirely when `any_of` is
//!   empty, so an empty `any_of` does NOT empty the result the way a
//!   standalone [`union`] would.
//!
//! These rules are deliberate and locked by tests; do not unify them.

mod compressed;
mod dense;
mod scan;

use cardbox_core::exec::ExecMode;

/// One card's membership facts as the engine sees them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniverseRecord {
    /// The card's stable 31-bit bitmap position.
    pub position: u32,
    /// Bitmap values of the card's tags.
    pub tag_bits: Vec<u32>,
}

impl UniverseRecord {
    pub fn new(position: u32, tag_bits: Vec<u32>) -> Self {
        Self { position, tag_bits }
    }
}

/// A filter with tag names already resolved to bitmap values.
///
/// Clause semantics: keep records whose tags are a superset of
/// `required`, intersect `any_of` (when non-empty), and miss `exclude`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitFilter {
    pub required: Vec<u32>,
    pub any_of: Vec<u32>,
    pub exclude: Vec<u32>,
}

impl BitFilter {
    pub fn is_empty(&self) -> bool {
        self.required.is_empty() && self.any_of.is_empty() && self.exclude.is_empty()
    }
}

/// Evaluate a filter in the given mode.
///
/// This is the shared kernel: empty `required` means no narrowing, empty
/// `any_of` means that phase is skipped, empty `exclude` removes nothing.
/// The standalone [`union`] wrapper layers its own empty rule on top.
pub fn execute(mode: ExecMode, filter: &BitFilter, universe: &[UniverseRecord]) -> Vec<u32> {
    match mode {
        ExecMode::RegularScan => scan::sequential(filter, universe),
        ExecMode::ParallelScan => scan::parallel(filter, universe),
        ExecMode::DenseBitmap => dense::evaluate(filter, universe),
        ExecMode::CompressedBitmap => compressed::evaluate(filter, universe),
    }
}

/// Records whose tags contain every member of `required`.
///
/// `intersection(∅, U) == U`: no requirements, nothing filtered out.
pub fn intersection(mode: ExecMode, required: &[u32], universe: &[UniverseRecord]) -> Vec<u32> {
    execute(
        mode,
        &BitFilter {
            required: required.to_vec(),
            ..BitFilter::default()
        },
        universe,
    )
}

/// Records whose tags intersect `any_of`.
///
/// `union(∅, U) == ∅`: with no tags listed, no record can match one.
/// This is the mirror image of [`intersection`]'s empty rule.
pub fn union(mode: ExecMode, any_of: &[u32], universe: &[UniverseRecord]) -> Vec<u32> {
    if any_of.is_empty() {
        return Vec::new();
    }
    execute(
        mode,
        &BitFilter {
            any_of: any_of.to_vec(),
            ..BitFilter::default()
        },
        universe,
    )
}

/// Two-phase filter: narrow to `required` supersets, then keep records
/// intersecting `any_of`.
///
/// When `any_of` is empty the second phase is skipped and phase one's
/// result is returned unchanged. That differs from the standalone
/// [`union`] contract on purpose.
pub fn complex_filter(
    mode: ExecMode,
    required: &[u32],
    any_of: &[u32],
    universe: &[UniverseRecord],
) -> Vec<u32> {
    execute(
        mode,
        &BitFilter {
            required: required.to_vec(),
            any_of: any_of.to_vec(),
            exclude: Vec::new(),
        },
        universe,
    )
}

/// Records whose tags miss every member of `exclude`.
///
/// `exclusion(∅, U) == U`: nothing listed, nothing removed.
pub fn exclusion(mode: ExecMode, exclude: &[u32], universe: &[UniverseRecord]) -> Vec<u32> {
    execute(
        mode,
        &BitFilter {
            exclude: exclude.to_vec(),
            ..BitFilter::default()
        },
        universe,
    )
}

/// Whether a record's tags satisfy every clause of the filter.
pub(crate) fn matches(filter: &BitFilter, tag_bits: &[u32]) -> bool {
    filter.required.iter().all(|t| tag_bits.contains(t))
        && (filter.any_of.is_empty() || filter.any_of.iter().any(|t| tag_bits.contains(t)))
        && !filter.exclude.iter().any(|t| tag_bits.contains(t))
}

/// Normalize a result to the shared output contract.
pub(crate) fn finalize(mut positions: Vec<u32>) -> Vec<u32> {
    positions.sort_unstable();
    positions.dedup();
    positions
}
