/// Remote mirror and sync queue errors.
///
/// These are caught and logged at the hybrid-store boundary; a failed
/// mirror push never fails the local write that produced it.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("remote mirror unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("mirror rejected entity {entity_id}: {reason}")]
    Rejected { entity_id: String, reason: String },

    #[error("checksum mismatch for entity {entity_id}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        entity_id: String,
        expected: String,
        actual: String,
    },

    #[error("sync queue error: {reason}")]
    QueueError { reason: String },
}
