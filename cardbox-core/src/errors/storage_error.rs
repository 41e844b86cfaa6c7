/// Storage-layer errors for SQLite operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("SQLite error: {message}")]
    SqliteError { message: String },

    #[error("migration failed at version {version}: {reason}")]
    MigrationFailed { version: u32, reason: String },

    #[error("index build failed for workspace {workspace}: {reason}")]
    IndexBuildFailed { workspace: String, reason: String },

    #[error("{what} lock poisoned")]
    LockPoisoned { what: &'static str },

    #[error("content encryption failed: {reason}")]
    EncryptionFailed { reason: String },
}
