//! Execution-mode vocabulary shared by the set-operation engine and the
//! adaptive tracker.

use serde::{Deserialize, Serialize};

/// The four algorithms a filter query can be evaluated with.
///
/// Declaration order is the tie-break order during mode selection: when
/// two modes predict the same cost, the earlier one wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecMode {
    /// Sequential predicate scan over the universe.
    RegularScan,
    /// Rayon-parallel predicate scan.
    ParallelScan,
    /// Fixed-width `u64` word bitsets over the universe's index space.
    DenseBitmap,
    /// Roaring compressed bitmaps.
    CompressedBitmap,
}

impl ExecMode {
    /// Total number of modes.
    pub const COUNT: usize = 4;

    /// All variants, in tie-break order.
    pub const ALL: [ExecMode; 4] = [
        Self::RegularScan,
        Self::ParallelScan,
        Self::DenseBitmap,
        Self::CompressedBitmap,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RegularScan => "regular_scan",
            Self::ParallelScan => "parallel_scan",
            Self::DenseBitmap => "dense_bitmap",
            Self::CompressedBitmap => "compressed_bitmap",
        }
    }
}

impl std::fmt::Display for ExecMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The set operation a filter query reduces to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    /// All required tags present.
    Intersection,
    /// At least one listed tag present.
    Union,
    /// Required narrowing followed by an any-of pass.
    ComplexFilter,
    /// None of the listed tags present.
    Exclusion,
}

impl OperationType {
    pub const COUNT: usize = 4;

    pub const ALL: [OperationType; 4] = [
        Self::Intersection,
        Self::Union,
        Self::ComplexFilter,
        Self::Exclusion,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Intersection => "intersection",
            Self::Union => "union",
            Self::ComplexFilter => "complex_filter",
            Self::Exclusion => "exclusion",
        }
    }
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The cost-relevant shape of a query, as the tracker sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryShape {
    /// Records in the universe being filtered.
    pub record_count: usize,
    /// Distinct tags referenced across all filter clauses.
    pub distinct_tag_count: usize,
    /// The operation the filter reduces to.
    pub op_type: OperationType,
}

/// Timing feedback from one executed operation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExecMetrics {
    /// The mode that ran.
    pub mode: ExecMode,
    /// The shape it ran against.
    pub shape: QueryShape,
    /// Wall-clock time the operation took.
    pub elapsed_ms: f64,
}
