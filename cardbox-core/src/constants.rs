/// Cardbox system version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Soft latency budget for tag filter queries, in milliseconds.
/// Breaches are logged as warnings, never surfaced as errors.
pub const FILTER_LATENCY_BUDGET_MS: u64 = 50;

/// Bitmap and position values are constrained to 31 bits so they fit a
/// signed 32-bit integer column without sign surprises.
pub const BITMAP_VALUE_MASK: u32 = 0x7FFF_FFFF;

/// Cost multiplier applied to dense-bitmap predictions before mode
/// selection, covering bitset construction overhead the linear model
/// does not capture.
pub const DENSE_BITMAP_SAFETY: f64 = 1.10;

/// Cost multiplier applied to compressed-bitmap predictions before mode
/// selection.
pub const COMPRESSED_BITMAP_SAFETY: f64 = 1.05;

/// Blend weight given to a remote telemetry prediction over the locally
/// combined estimate.
pub const TELEMETRY_BLEND_WEIGHT: f64 = 0.7;

/// Maximum batch size for bulk mirror pushes.
pub const MAX_SYNC_BATCH_SIZE: usize = 256;
