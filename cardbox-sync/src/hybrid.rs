//! Local-first store with a mirrored remote.
//!
//! Every mutation commits locally and stages a queue entry in the same
//! transaction; a background worker pushes staged entries to the mirror.
//! Reads never touch the network. Mirror failures are logged and retried,
//! never surfaced to the caller that wrote.

use std::sync::Arc;

use cardbox_core::config::SyncConfig;
use cardbox_core::errors::CardboxResult;
use cardbox_core::model::{Card, Tag};
use cardbox_core::scope::ScopeKey;
use cardbox_core::traits::{CardStore, MirrorPayload, RemoteMirror, TagFilter};
use cardbox_storage::LocalStore;

use crate::queue::{self, EntityKind, QueueCounts, QueueOp};
use crate::worker::{drain_once, DrainReport, DrainWorker};

/// A [`CardStore`] that is authoritative locally and eventually consistent
/// remotely.
pub struct HybridStore {
    // Declared first so drop stops and joins the worker before the
    // store's own handles go away.
    worker: Option<DrainWorker>,
    local: Arc<LocalStore>,
    mirror: Arc<dyn RemoteMirror>,
    config: SyncConfig,
}

impl HybridStore {
    /// Wrap a local store and start the background drain worker.
    pub fn new(local: Arc<LocalStore>, mirror: Arc<dyn RemoteMirror>, config: SyncConfig) -> Self {
        let worker = DrainWorker::spawn(Arc::clone(&local), Arc::clone(&mirror), config.clone());
        Self {
            worker: Some(worker),
            local,
            mirror,
            config,
        }
    }

    /// Wrap a local store without a background worker. Draining then only
    /// happens through [`HybridStore::drain_now`]; tests use this for
    /// deterministic sweeps.
    pub fn without_worker(
        local: Arc<LocalStore>,
        mirror: Arc<dyn RemoteMirror>,
        config: SyncConfig,
    ) -> Self {
        Self {
            worker: None,
            local,
            mirror,
            config,
        }
    }

    /// The wrapped local store.
    pub fn local(&self) -> &LocalStore {
        &self.local
    }

    /// Run one drain sweep on the calling thread.
    pub fn drain_now(&self) -> CardboxResult<DrainReport> {
        drain_once(&self.local, self.mirror.as_ref(), &self.config)
    }

    /// Pending and parked entry counts.
    pub fn queue_counts(&self) -> CardboxResult<QueueCounts> {
        self.local.pool().writer.with_conn(queue::counts)
    }
}

impl CardStore for HybridStore {
    fn cards_by_tags(&self, scope: &ScopeKey, filter: &TagFilter) -> CardboxResult<Vec<Card>> {
        self.local.cards_by_tags(scope, filter)
    }

    fn card_by_id(&self, scope: &ScopeKey, id: &str) -> CardboxResult<Card> {
        self.local.card_by_id(scope, id)
    }

    fn all_tags(&self, scope: &ScopeKey) -> CardboxResult<Vec<Tag>> {
        self.local.all_tags(scope)
    }

    /// Saves locally, bumping the card's sync version, and stages mirror
    /// projections for the card and any tags the save created or revived.
    fn save_card(&self, card: &Card) -> CardboxResult<()> {
        let mut outgoing = card.clone();
        outgoing.sync_version += 1;

        self.local.save_card_with(&outgoing, |tx, saved, created| {
            queue::enqueue_in_tx(
                tx,
                EntityKind::Card,
                QueueOp::Upsert,
                &saved.scope,
                &MirrorPayload::for_card(saved),
            )?;
            for tag in created {
                queue::enqueue_in_tx(
                    tx,
                    EntityKind::Tag,
                    QueueOp::Upsert,
                    &tag.scope,
                    &MirrorPayload::for_tag(tag),
                )?;
            }
            Ok(())
        })
    }

    fn delete_card(&self, scope: &ScopeKey, id: &str) -> CardboxResult<()> {
        self.local.delete_card_with(scope, id, |tx, deleted| {
            queue::enqueue_in_tx(
                tx,
                EntityKind::Card,
                QueueOp::Delete,
                &deleted.scope,
                &MirrorPayload::for_card(deleted),
            )
        })
    }

    /// Tag removal is not part of the mirror surface; the tombstoned tag
    /// is staged as its latest projection instead.
    fn delete_tag(&self, scope: &ScopeKey, name: &str) -> CardboxResult<()> {
        self.local.delete_tag_with(scope, name, |tx, tag| {
            queue::enqueue_in_tx(
                tx,
                EntityKind::Tag,
                QueueOp::Upsert,
                &tag.scope,
                &MirrorPayload::for_tag(tag),
            )
        })
    }

    fn can_sync(&self) -> bool {
        true
    }
}
