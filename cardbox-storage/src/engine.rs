//! The local storage engine: SQLite rows underneath, per-scope bitmap
//! indexes on top, with the adaptive tracker picking how each filter
//! query executes.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use rusqlite::Transaction;

use cardbox_adaptive::PerfTracker;
use cardbox_core::config::StorageConfig;
use cardbox_core::constants::FILTER_LATENCY_BUDGET_MS;
use cardbox_core::errors::{CardboxError, CardboxResult, StorageError};
use cardbox_core::exec::{ExecMetrics, ExecMode, OperationType, QueryShape};
use cardbox_core::model::bitmap::{derive_tag_bitmap, derive_tag_id};
use cardbox_core::model::{Card, Tag};
use cardbox_core::scope::{ScopeKey, WorkspaceId};
use cardbox_core::traits::{CardStore, TagFilter};
use cardbox_index::setops::{self, BitFilter};
use cardbox_index::{IndexRegistry, ScopeIndex};

use crate::crypto::ContentCipher;
use crate::migrations;
use crate::pool::ConnectionPool;
use crate::queries::{card_crud, in_transaction, tag_counts};

/// Local SQLite-backed store.
///
/// Owns the connection pool, every scope's in-memory tag index, and the
/// tracker that picks execution modes. All mutations run through the
/// writer connection inside a transaction; the index is updated only
/// after the transaction commits.
pub struct LocalStore {
    pool: ConnectionPool,
    index: IndexRegistry,
    tracker: Arc<PerfTracker>,
    cipher: Option<ContentCipher>,
    use_read_pool: bool,
}

impl LocalStore {
    /// Open (or create) the database at `path`, run migrations, and build
    /// the index for every scope found in storage.
    pub fn open(
        path: &Path,
        config: &StorageConfig,
        tracker: Arc<PerfTracker>,
    ) -> CardboxResult<Self> {
        let pool = ConnectionPool::open(path, config)?;
        let cipher = build_cipher(config)?;
        let store = Self {
            pool,
            index: IndexRegistry::new(),
            tracker,
            cipher,
            use_read_pool: true,
        };
        store.initialize()?;
        Ok(store)
    }

    /// In-memory store for tests. Reads are routed through the writer
    /// because separate in-memory connections see separate databases.
    pub fn open_in_memory(
        config: &StorageConfig,
        tracker: Arc<PerfTracker>,
    ) -> CardboxResult<Self> {
        let pool = ConnectionPool::open_in_memory(config)?;
        let cipher = build_cipher(config)?;
        let store = Self {
            pool,
            index: IndexRegistry::new(),
            tracker,
            cipher,
            use_read_pool: false,
        };
        store.initialize()?;
        Ok(store)
    }

    fn initialize(&self) -> CardboxResult<()> {
        self.pool.writer.with_conn(|conn| {
            migrations::run_migrations(conn)?;
            Ok(())
        })?;
        self.build_index()
    }

    /// Build every scope's index from storage.
    ///
    /// Any failure here is fatal: a store with a partial index would
    /// silently drop cards from query results.
    fn build_index(&self) -> CardboxResult<()> {
        let rows = self.pool.writer.with_conn(card_crud::load_index_rows)?;

        let mut by_scope: HashMap<ScopeKey, ScopeIndex> = HashMap::new();
        for card in &rows {
            card.check_projection()
                .map_err(|e| StorageError::IndexBuildFailed {
                    workspace: card.scope.workspace.as_str().to_string(),
                    reason: format!("card {}: {e}", card.id),
                })?;
            by_scope
                .entry(card.scope.clone())
                .or_default()
                .upsert_card(card);
        }

        let scopes = by_scope.len();
        for (scope, index) in by_scope {
            self.index.replace_scope(scope, index)?;
        }
        tracing::info!(cards = rows.len(), scopes, "tag index built");
        Ok(())
    }

    /// The pool, for subsystems that share the database file.
    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    pub fn tracker(&self) -> &Arc<PerfTracker> {
        &self.tracker
    }

    fn with_reader<F, T>(&self, f: F) -> CardboxResult<T>
    where
        F: FnOnce(&rusqlite::Connection) -> CardboxResult<T>,
    {
        if self.use_read_pool {
            self.pool.readers.with_conn(f)
        } else {
            self.pool.writer.with_conn(f)
        }
    }

    /// Save a card with a hook running inside the same transaction.
    ///
    /// The hook sees the card being persisted and any tag rows this save
    /// created or revived; anything it writes commits or rolls back with
    /// the card.
    pub fn save_card_with(
        &self,
        card: &Card,
        hook: impl FnOnce(&Transaction<'_>, &Card, &[Tag]) -> CardboxResult<()>,
    ) -> CardboxResult<()> {
        card.check_projection()?;

        self.pool.writer.with_conn(|conn| {
            in_transaction(conn, "save_card", |tx| {
                let existing =
                    card_crud::fetch_card(tx, &card.scope, &card.id, self.cipher.as_ref())?;

                let created = match existing {
                    None if !card.is_deleted() => {
                        tag_counts::create_card_with_counts(tx, card, self.cipher.as_ref())?
                    }
                    None => {
                        // Replaying a tombstone: row only, counts stay.
                        let rows =
                            card_crud::upsert_card_row(tx, card, self.cipher.as_ref())?;
                        if rows == 0 {
                            return Err(CardboxError::CardNotFound {
                                id: card.id.clone(),
                            });
                        }
                        Vec::new()
                    }
                    Some(stored) => {
                        let old_tags = if stored.is_deleted() {
                            // Counts were already released when it was deleted.
                            Vec::new()
                        } else {
                            stored.tags.clone()
                        };
                        let new_tags = if card.is_deleted() {
                            Vec::new()
                        } else {
                            card.tags.clone()
                        };
                        card_crud::upsert_card_row(tx, card, self.cipher.as_ref())?;
                        tag_counts::update_counts_on_reassignment(
                            tx, &card.scope, &old_tags, &new_tags,
                        )?
                    }
                };

                hook(tx, card, &created)
            })
        })?;

        // The index follows committed state only.
        if card.is_deleted() {
            self.index.remove_card(&card.scope, &card.id)?;
        } else {
            self.index.upsert_card(card)?;
        }
        Ok(())
    }

    /// Soft-delete a card with a hook running inside the same transaction.
    ///
    /// The hook sees the card as it looks after deletion (tombstone set,
    /// version bumped).
    pub fn delete_card_with(
        &self,
        scope: &ScopeKey,
        id: &str,
        hook: impl FnOnce(&Transaction<'_>, &Card) -> CardboxResult<()>,
    ) -> CardboxResult<()> {
        self.pool.writer.with_conn(|conn| {
            in_transaction(conn, "delete_card", |tx| {
                let stored = card_crud::fetch_card(tx, scope, id, self.cipher.as_ref())?;
                let Some(mut card) = stored.filter(|c| !c.is_deleted()) else {
                    return Err(CardboxError::CardNotFound { id: id.to_string() });
                };

                card.mark_deleted();
                card.sync_version += 1;
                let when = card.deleted.unwrap_or_else(chrono::Utc::now);

                card_crud::soft_delete_card(tx, scope, id, when)?;
                tag_counts::decrement_counts(tx, scope, &card.tags)?;
                hook(tx, &card)
            })
        })?;

        self.index.remove_card(scope, id)?;
        Ok(())
    }

    /// Soft-delete a tag with a hook running inside the same transaction.
    pub fn delete_tag_with(
        &self,
        scope: &ScopeKey,
        name: &str,
        hook: impl FnOnce(&Transaction<'_>, &Tag) -> CardboxResult<()>,
    ) -> CardboxResult<()> {
        self.pool.writer.with_conn(|conn| {
            in_transaction(conn, "delete_tag", |tx| {
                match tag_counts::soft_delete_tag(tx, scope, name)? {
                    Some(tag) => hook(tx, &tag),
                    None => Err(CardboxError::TagNotFound {
                        id: derive_tag_id(&scope.workspace, name),
                    }),
                }
            })
        })
    }

    /// Filter dispatch: pick a mode, run the set operation against the
    /// scope's index, then hydrate the matching rows.
    fn query_cards(&self, scope: &ScopeKey, filter: &TagFilter) -> CardboxResult<Vec<Card>> {
        let started = Instant::now();

        // An empty filter is a plain listing; no mode selection involved.
        if filter.is_empty() {
            return self.with_reader(|conn| card_crud::list_cards(conn, scope, self.cipher.as_ref()));
        }

        let bits = resolve_filter(&scope.workspace, filter);
        let record_count = self
            .index
            .with_scope(scope, ScopeIndex::len)?
            .unwrap_or(0);
        let shape = QueryShape {
            record_count,
            distinct_tag_count: filter.distinct_tag_count(),
            op_type: classify(filter),
        };
        let mode = self.tracker.select_best_mode(&shape, &ExecMode::ALL)?;

        let positions = match mode {
            // The maintained per-tag roaring bitmaps are the compressed
            // representation; no universe scan needed.
            ExecMode::CompressedBitmap => self
                .index
                .with_scope(scope, |index| index.execute_filter(&bits))?
                .unwrap_or_default(),
            other => {
                let universe = self
                    .index
                    .with_scope(scope, ScopeIndex::universe)?
                    .unwrap_or_default();
                setops::execute(other, &bits, &universe)
            }
        };

        let ids = self
            .index
            .with_scope(scope, |index| index.resolve(&positions))?
            .unwrap_or_default();
        let cards = if ids.is_empty() {
            Vec::new()
        } else {
            self.with_reader(|conn| {
                card_crud::cards_by_ids(conn, scope, &ids, self.cipher.as_ref())
            })?
        };

        let elapsed_ms = started.elapsed().as_secs_f64() * 1_000.0;
        if elapsed_ms > FILTER_LATENCY_BUDGET_MS as f64 {
            tracing::warn!(
                workspace = %scope.workspace,
                mode = %mode,
                records = record_count,
                elapsed_ms,
                "tag filter exceeded the latency budget"
            );
        }
        self.tracker.record_actual(&ExecMetrics {
            mode,
            shape,
            elapsed_ms,
        })?;

        Ok(cards)
    }
}

impl CardStore for LocalStore {
    fn cards_by_tags(&self, scope: &ScopeKey, filter: &TagFilter) -> CardboxResult<Vec<Card>> {
        self.query_cards(scope, filter)
    }

    fn card_by_id(&self, scope: &ScopeKey, id: &str) -> CardboxResult<Card> {
        let card =
            self.with_reader(|conn| card_crud::fetch_card(conn, scope, id, self.cipher.as_ref()))?;
        match card {
            Some(card) if !card.is_deleted() => Ok(card),
            _ => Err(CardboxError::CardNotFound { id: id.to_string() }),
        }
    }

    fn all_tags(&self, scope: &ScopeKey) -> CardboxResult<Vec<Tag>> {
        self.with_reader(|conn| tag_counts::list_tags(conn, scope))
    }

    fn save_card(&self, card: &Card) -> CardboxResult<()> {
        self.save_card_with(card, |_tx, _card, _created| Ok(()))
    }

    fn delete_card(&self, scope: &ScopeKey, id: &str) -> CardboxResult<()> {
        self.delete_card_with(scope, id, |_tx, _card| Ok(()))
    }

    fn delete_tag(&self, scope: &ScopeKey, name: &str) -> CardboxResult<()> {
        self.delete_tag_with(scope, name, |_tx, _tag| Ok(()))
    }

    fn can_sync(&self) -> bool {
        false
    }
}

/// Map a filter onto the set operation it reduces to.
fn classify(filter: &TagFilter) -> OperationType {
    match (!filter.required.is_empty(), !filter.any_of.is_empty()) {
        (true, true) => OperationType::ComplexFilter,
        (true, false) => OperationType::Intersection,
        (false, true) => OperationType::Union,
        (false, false) => OperationType::Exclusion,
    }
}

/// Resolve tag names structurally. Unknown names hash to bitmaps no card
/// carries, which is exactly the empty-result behavior filters promise.
fn resolve_filter(workspace: &WorkspaceId, filter: &TagFilter) -> BitFilter {
    let resolve =
        |names: &[String]| names.iter().map(|n| derive_tag_bitmap(workspace, n)).collect();
    BitFilter {
        required: resolve(&filter.required),
        any_of: resolve(&filter.any_of),
        exclude: resolve(&filter.exclude),
    }
}

fn build_cipher(config: &StorageConfig) -> CardboxResult<Option<ContentCipher>> {
    match &config.content_key_hex {
        Some(hex_key) => Ok(Some(ContentCipher::from_hex_key(hex_key)?)),
        None => Ok(None),
    }
}
