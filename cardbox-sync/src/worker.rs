//! Background queue drain.
//!
//! A dedicated thread sweeps the queue every drain interval and pushes
//! eligible entries to the mirror. Failures are recorded per entry and
//! retried with exponential backoff; nothing here ever reaches a
//! mutating caller.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use cardbox_core::config::SyncConfig;
use cardbox_core::errors::{CardboxResult, SyncError};
use cardbox_core::traits::RemoteMirror;
use cardbox_storage::LocalStore;

use crate::queue::{self, EntityKind, QueueOp};

/// What one drain sweep moved.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DrainReport {
    /// Entries delivered and removed from the queue.
    pub pushed: usize,
    /// Entries that failed and were rescheduled.
    pub retried: usize,
    /// Entries that exhausted their attempts and were parked.
    pub parked: usize,
}

/// One synchronous drain sweep.
///
/// Skips entirely when the mirror reports itself unreachable. A mid-batch
/// `Unavailable` stops the sweep early; per-entry rejections only fail
/// that entry.
pub fn drain_once(
    local: &LocalStore,
    mirror: &dyn RemoteMirror,
    config: &SyncConfig,
) -> CardboxResult<DrainReport> {
    let mut report = DrainReport::default();
    if !mirror.can_sync() {
        return Ok(report);
    }

    let batch = local
        .pool()
        .writer
        .with_conn(|conn| queue::claim_batch(conn, config.batch_size))?;

    for entry in batch {
        let outcome = match (entry.entity_kind, entry.operation) {
            (EntityKind::Card, QueueOp::Upsert) => mirror.upsert_card(&entry.payload),
            (EntityKind::Card, QueueOp::Delete) => mirror.delete_card(&entry.entity_id),
            // The mirror surface has no tag removal; a deleted tag is
            // pushed as its latest projection.
            (EntityKind::Tag, _) => mirror.upsert_tag(&entry.payload),
        };

        match outcome {
            Ok(()) => {
                local
                    .pool()
                    .writer
                    .with_conn(|conn| queue::mark_done(conn, entry.id))?;
                report.pushed += 1;
            }
            Err(e) => {
                let unavailable = matches!(e, SyncError::Unavailable { .. });
                let parked = local.pool().writer.with_conn(|conn| {
                    queue::mark_failed(conn, entry.id, &e.to_string(), config)
                })?;
                if parked {
                    report.parked += 1;
                    tracing::warn!(
                        entity = %entry.entity_id,
                        attempts = entry.attempts + 1,
                        error = %e,
                        "mirror push failed; entry parked"
                    );
                } else {
                    report.retried += 1;
                    tracing::warn!(
                        entity = %entry.entity_id,
                        attempts = entry.attempts + 1,
                        error = %e,
                        "mirror push failed; retry scheduled"
                    );
                }
                if unavailable {
                    // The rest of the batch would hit the same wall.
                    break;
                }
            }
        }
    }

    Ok(report)
}

/// The background drain thread. Dropping it stops the loop and joins the
/// thread.
pub(crate) struct DrainWorker {
    stop_tx: Option<mpsc::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl DrainWorker {
    pub(crate) fn spawn(
        local: Arc<LocalStore>,
        mirror: Arc<dyn RemoteMirror>,
        config: SyncConfig,
    ) -> Self {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let interval = Duration::from_secs(config.drain_interval_secs.max(1));

        let handle = std::thread::Builder::new()
            .name("cardbox-sync-drain".to_string())
            .spawn(move || loop {
                match stop_rx.recv_timeout(interval) {
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    Err(RecvTimeoutError::Timeout) => {}
                }
                match drain_once(&local, mirror.as_ref(), &config) {
                    Ok(report) if report.pushed + report.retried + report.parked > 0 => {
                        tracing::debug!(
                            pushed = report.pushed,
                            retried = report.retried,
                            parked = report.parked,
                            "drain sweep"
                        );
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!(error = %e, "drain sweep failed");
                    }
                }
            })
            .ok();

        if handle.is_none() {
            tracing::warn!("failed to spawn the drain worker; queue will only drain on demand");
        }

        Self {
            stop_tx: Some(stop_tx),
            handle,
        }
    }
}

impl Drop for DrainWorker {
    fn drop(&mut self) {
        self.stop_tx.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
