//! # cardbox-storage
//!
//! SQLite persistence for cards and tags: pooled connections, schema
//! migrations, transactional tag-count maintenance, optional content
//! encryption at rest, and [`LocalStore`], the local-only storage engine.

pub mod crypto;
pub mod engine;
pub mod migrations;
pub mod pool;
pub mod queries;

pub use crypto::ContentCipher;
pub use engine::LocalStore;

use cardbox_core::errors::{CardboxError, StorageError};

/// Wrap a SQLite error string into the umbrella error type.
pub(crate) fn to_storage_err(message: String) -> CardboxError {
    StorageError::SqliteError { message }.into()
}
