//! Query modules operating on raw connections and transactions.

pub mod card_crud;
pub mod tag_counts;

use rusqlite::{Connection, Transaction};

use cardbox_core::errors::{CardboxResult, TransactionError};

/// Run `f` inside a transaction: commit on success, roll back on error.
///
/// The inner error propagates unchanged after the rollback, so callers
/// can still match on domain errors like not-found. Begin and commit
/// failures surface as transaction errors naming `operation`.
pub fn in_transaction<T>(
    conn: &Connection,
    operation: &str,
    f: impl FnOnce(&Transaction<'_>) -> CardboxResult<T>,
) -> CardboxResult<T> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| TransactionError::BeginFailed {
            operation: operation.to_string(),
            reason: e.to_string(),
        })?;

    match f(&tx) {
        Ok(value) => {
            tx.commit().map_err(|e| TransactionError::CommitFailed {
                operation: operation.to_string(),
                reason: e.to_string(),
            })?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = tx.rollback() {
                return Err(TransactionError::RolledBack {
                    operation: operation.to_string(),
                    reason: format!("{e}; rollback also failed: {rollback_err}"),
                }
                .into());
            }
            Err(e)
        }
    }
}
