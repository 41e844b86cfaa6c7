// Single source of truth for all default values.

// --- Storage ---
pub const DEFAULT_DB_FILENAME: &str = "cardbox.db";
pub const DEFAULT_WAL_MODE: bool = true;
pub const DEFAULT_MMAP_SIZE: u64 = 268_435_456; // 256 MB
pub const DEFAULT_CACHE_SIZE: i64 = -64_000; // 64 MB (negative = KB)
pub const DEFAULT_BUSY_TIMEOUT_MS: u32 = 5_000;
pub const DEFAULT_READ_POOL_SIZE: usize = 4;

// --- Sync ---
pub const DEFAULT_SYNC_ENABLED: bool = false;
pub const DEFAULT_DRAIN_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_SYNC_BATCH_SIZE: usize = 32;
pub const DEFAULT_MAX_SYNC_ATTEMPTS: u32 = 8;
pub const DEFAULT_INITIAL_BACKOFF_MS: u64 = 500;
pub const DEFAULT_MAX_BACKOFF_MS: u64 = 60_000; // 1 minute

// --- Adaptive ---
pub const DEFAULT_HISTORY_CAPACITY: usize = 20;
pub const DEFAULT_CONFIDENCE_STEP: f64 = 0.02;
pub const DEFAULT_CONFIDENCE_CAP: f64 = 0.8;
pub const DEFAULT_TELEMETRY_CACHE_TTL_SECS: u64 = 60;
pub const DEFAULT_TELEMETRY_CACHE_CAPACITY: u64 = 1_024;

// --- Logging ---
pub const DEFAULT_LOG_LEVEL: &str = "info";
