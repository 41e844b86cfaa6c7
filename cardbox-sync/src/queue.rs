//! The durable outbound queue.
//!
//! Entries are staged by the hybrid store inside the transaction of the
//! local write they mirror, so a committed write always has its queue row
//! and a rolled-back write never does. One row per entity: re-staging an
//! entity replaces its previous row, and the mirror only ever receives
//! the latest projection.

use std::time::Duration;

use chrono::Utc;
use rusqlite::{params, Connection, Transaction};

use cardbox_core::config::SyncConfig;
use cardbox_core::constants::MAX_SYNC_BATCH_SIZE;
use cardbox_core::errors::{CardboxError, CardboxResult, SyncError};
use cardbox_core::scope::ScopeKey;
use cardbox_core::traits::MirrorPayload;

/// What kind of entity a queue entry mirrors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Card,
    Tag,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::Tag => "tag",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "card" => Some(Self::Card),
            "tag" => Some(Self::Tag),
            _ => None,
        }
    }
}

/// The mirror call a queue entry stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueOp {
    Upsert,
    Delete,
}

impl QueueOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upsert => "upsert",
            Self::Delete => "delete",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "upsert" => Some(Self::Upsert),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }
}

/// A claimed queue entry, ready to push.
#[derive(Debug, Clone)]
pub struct QueueEntry {
    pub id: i64,
    pub entity_kind: EntityKind,
    pub operation: QueueOp,
    pub entity_id: String,
    pub payload: MirrorPayload,
    pub attempts: u32,
}

/// Pending and parked entry counts, for operational visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueCounts {
    pub pending: u64,
    pub failed: u64,
}

pub(crate) fn queue_err(e: impl std::fmt::Display) -> CardboxError {
    SyncError::QueueError {
        reason: e.to_string(),
    }
    .into()
}

/// Stage an operation in the caller's transaction.
pub fn enqueue_in_tx(
    tx: &Transaction<'_>,
    kind: EntityKind,
    operation: QueueOp,
    scope: &ScopeKey,
    payload: &MirrorPayload,
) -> CardboxResult<()> {
    let payload_json = serde_json::to_string(payload)?;
    let now = Utc::now().to_rfc3339();
    tx.execute(
        "INSERT OR REPLACE INTO sync_queue (
            entity_kind, operation, entity_id, workspace_id, owner_id,
            payload, status, attempts, next_attempt_at, last_error, created, updated
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'pending', 0, NULL, NULL, ?7, ?7)",
        params![
            kind.as_str(),
            operation.as_str(),
            payload.entity_id,
            scope.workspace.as_str(),
            scope.owner.as_str(),
            payload_json,
            now,
        ],
    )
    .map_err(queue_err)?;
    Ok(())
}

/// Entries eligible to push right now: pending rows whose backoff window
/// (if any) has elapsed, oldest first. `limit` is capped at
/// [`MAX_SYNC_BATCH_SIZE`].
pub fn claim_batch(conn: &Connection, limit: usize) -> CardboxResult<Vec<QueueEntry>> {
    let limit = limit.min(MAX_SYNC_BATCH_SIZE);
    let now = Utc::now().to_rfc3339();
    let mut stmt = conn
        .prepare(
            "SELECT id, entity_kind, operation, entity_id, payload, attempts
             FROM sync_queue
             WHERE status = 'pending'
               AND (next_attempt_at IS NULL OR next_attempt_at <= ?1)
             ORDER BY id
             LIMIT ?2",
        )
        .map_err(queue_err)?;

    let rows = stmt
        .query_map(params![now, limit as i64], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, i64>(5)?,
            ))
        })
        .map_err(queue_err)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(queue_err)?;

    let mut entries = Vec::with_capacity(rows.len());
    for (id, kind_str, op_str, entity_id, payload_json, attempts) in rows {
        let entity_kind = EntityKind::parse(&kind_str)
            .ok_or_else(|| queue_err(format!("unknown entity kind '{kind_str}'")))?;
        let operation = QueueOp::parse(&op_str)
            .ok_or_else(|| queue_err(format!("unknown operation '{op_str}'")))?;
        let payload: MirrorPayload = serde_json::from_str(&payload_json)?;
        entries.push(QueueEntry {
            id,
            entity_kind,
            operation,
            entity_id,
            payload,
            attempts: attempts as u32,
        });
    }
    Ok(entries)
}

/// Remove a delivered entry.
pub fn mark_done(conn: &Connection, id: i64) -> CardboxResult<()> {
    conn.execute("DELETE FROM sync_queue WHERE id = ?1", params![id])
        .map_err(queue_err)?;
    Ok(())
}

/// Record a failed push. Schedules the next attempt with exponential
/// backoff, or parks the entry as failed once attempts are exhausted.
/// Returns `true` when the entry was parked.
pub fn mark_failed(
    conn: &Connection,
    id: i64,
    error: &str,
    config: &SyncConfig,
) -> CardboxResult<bool> {
    let attempts: u32 = conn
        .query_row(
            "SELECT attempts FROM sync_queue WHERE id = ?1",
            params![id],
            |row| row.get::<_, i64>(0),
        )
        .map_err(queue_err)? as u32;
    let attempts = attempts + 1;
    let now = Utc::now();

    if attempts >= config.max_attempts {
        conn.execute(
            "UPDATE sync_queue
             SET status = 'failed', attempts = ?2, next_attempt_at = NULL,
                 last_error = ?3, updated = ?4
             WHERE id = ?1",
            params![id, attempts, error, now.to_rfc3339()],
        )
        .map_err(queue_err)?;
        return Ok(true);
    }

    let delay = backoff_delay(attempts, config);
    let next = now + chrono::Duration::milliseconds(delay.as_millis() as i64);
    conn.execute(
        "UPDATE sync_queue
         SET attempts = ?2, next_attempt_at = ?3, last_error = ?4, updated = ?5
         WHERE id = ?1",
        params![
            id,
            attempts,
            next.to_rfc3339(),
            error,
            now.to_rfc3339()
        ],
    )
    .map_err(queue_err)?;
    Ok(false)
}

/// Pending and parked entry counts.
pub fn counts(conn: &Connection) -> CardboxResult<QueueCounts> {
    let count_where = |status: &str| -> CardboxResult<u64> {
        conn.query_row(
            "SELECT COUNT(*) FROM sync_queue WHERE status = ?1",
            params![status],
            |row| row.get::<_, i64>(0),
        )
        .map(|n| n as u64)
        .map_err(queue_err)
    };
    Ok(QueueCounts {
        pending: count_where("pending")?,
        failed: count_where("failed")?,
    })
}

/// Delay before retry number `attempts`: the initial delay doubled per
/// failure, clamped to the configured ceiling.
pub fn backoff_delay(attempts: u32, config: &SyncConfig) -> Duration {
    let doublings = attempts.saturating_sub(1).min(16);
    let ms = config
        .initial_backoff_ms
        .saturating_mul(1u64 << doublings)
        .min(config.max_backoff_ms);
    Duration::from_millis(ms)
}
