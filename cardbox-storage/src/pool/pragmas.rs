//! PRAGMA configuration applied to every SQLite connection.
//!
//! Journal mode, NORMAL sync, mmap and cache sizing, busy timeout,
//! foreign_keys ON, incremental auto_vacuum. All knobs come from
//! [`StorageConfig`].

use rusqlite::Connection;

use cardbox_core::config::StorageConfig;
use cardbox_core::errors::CardboxResult;

use crate::to_storage_err;

/// Apply all performance and safety pragmas to a write connection.
pub fn apply_pragmas(conn: &Connection, config: &StorageConfig) -> CardboxResult<()> {
    let journal_mode = if config.wal_mode { "WAL" } else { "DELETE" };
    conn.execute_batch(&format!(
        "
        PRAGMA journal_mode = {journal_mode};
        PRAGMA synchronous = NORMAL;
        PRAGMA mmap_size = {mmap};
        PRAGMA cache_size = {cache};
        PRAGMA busy_timeout = {busy};
        PRAGMA foreign_keys = ON;
        PRAGMA auto_vacuum = INCREMENTAL;
        ",
        mmap = config.mmap_size,
        cache = config.cache_size,
        busy = config.busy_timeout_ms,
    ))
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Apply the read-path subset: sizing and timeout only. Read connections
/// are opened read-only and inherit the database's journal mode.
pub fn apply_read_pragmas(conn: &Connection, config: &StorageConfig) -> CardboxResult<()> {
    conn.execute_batch(&format!(
        "
        PRAGMA mmap_size = {mmap};
        PRAGMA cache_size = {cache};
        PRAGMA busy_timeout = {busy};
        ",
        mmap = config.mmap_size,
        cache = config.cache_size,
        busy = config.busy_timeout_ms,
    ))
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Verify that WAL mode is active on a connection.
pub fn verify_wal_mode(conn: &Connection) -> CardboxResult<bool> {
    let mode: String = conn
        .pragma_query_value(None, "journal_mode", |row| row.get(0))
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(mode.eq_ignore_ascii_case("wal"))
}
