//! Single write connection behind a mutex. Serialized writes, no
//! contention.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;

use cardbox_core::config::StorageConfig;
use cardbox_core::errors::{CardboxResult, StorageError};

use super::pragmas::apply_pragmas;
use crate::to_storage_err;

/// The one connection allowed to write.
pub struct WriteConnection {
    conn: Mutex<Connection>,
}

impl WriteConnection {
    /// Open a write connection to the given database path.
    pub fn open(path: &Path, config: &StorageConfig) -> CardboxResult<Self> {
        let conn = Connection::open(path).map_err(|e| to_storage_err(e.to_string()))?;
        apply_pragmas(&conn, config)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory(config: &StorageConfig) -> CardboxResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| to_storage_err(e.to_string()))?;
        apply_pragmas(&conn, config)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the write lock and run a closure with the connection.
    pub fn with_conn<F, T>(&self, f: F) -> CardboxResult<T>
    where
        F: FnOnce(&Connection) -> CardboxResult<T>,
    {
        let guard = self.conn.lock().map_err(|_| StorageError::LockPoisoned {
            what: "write connection",
        })?;
        f(&guard)
    }
}
