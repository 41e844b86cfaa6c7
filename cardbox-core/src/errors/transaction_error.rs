/// Errors from multi-statement maintenance transactions.
///
/// Any variant means the whole transaction was rolled back; callers may
/// assume no partial effects were applied.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    #[error("failed to begin transaction for {operation}: {reason}")]
    BeginFailed { operation: String, reason: String },

    #[error("{operation} rolled back: {reason}")]
    RolledBack { operation: String, reason: String },

    #[error("failed to commit {operation}: {reason}")]
    CommitFailed { operation: String, reason: String },
}
