//! Error taxonomy: one enum per subsystem plus the `CardboxError` umbrella.
//!
//! Subsystem errors convert into the umbrella via `#[from]`, so `?` works
//! across crate boundaries without manual mapping.

mod adaptive_error;
mod storage_error;
mod sync_error;
mod transaction_error;
mod validation_error;

pub use adaptive_error::AdaptiveError;
pub use storage_error::StorageError;
pub use sync_error::SyncError;
pub use transaction_error::TransactionError;
pub use validation_error::ValidationError;

/// Crate-wide result alias.
pub type CardboxResult<T> = Result<T, CardboxError>;

/// Umbrella error for the whole system.
#[derive(Debug, thiserror::Error)]
pub enum CardboxError {
    #[error("card not found: {id}")]
    CardNotFound { id: String },

    #[error("tag not found: {id}")]
    TagNotFound { id: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Transaction(#[from] TransactionError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Adaptive(#[from] AdaptiveError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("config error: {reason}")]
    Config { reason: String },
}

impl CardboxError {
    /// Whether this error left durable state untouched (safe to retry).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CardboxError::Transaction(_) | CardboxError::Sync(SyncError::Unavailable { .. })
        )
    }
}
