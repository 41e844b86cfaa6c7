//! Per-scope inverted index: tag bitmap value → positions of the cards
//! carrying that tag.
//!
//! The index is the authoritative in-memory answer to "which cards carry
//! these tags". It is built from storage once at startup and maintained
//! incrementally on every save and delete, with a remove-then-add
//! discipline so a card is never double-counted while its tag set
//! changes.

use std::collections::HashMap;
use std::sync::RwLock;

use roaring::RoaringBitmap;

use cardbox_core::errors::{CardboxResult, StorageError};
use cardbox_core::model::bitmap::derive_card_position;
use cardbox_core::model::Card;
use cardbox_core::scope::ScopeKey;

use crate::setops::{BitFilter, UniverseRecord};

#[derive(Debug, Clone)]
struct CardEntry {
    id: String,
    tag_bits: Vec<u32>,
}

/// The inverted index for one `(workspace, owner)` scope.
#[derive(Debug, Default)]
pub struct ScopeIndex {
    /// tag bitmap value → positions of cards carrying it.
    tag_bitmaps: HashMap<u32, RoaringBitmap>,
    /// position → card entry, for membership facts and id resolution.
    records: HashMap<u32, CardEntry>,
    /// Every indexed position, tagged or not.
    all_cards: RoaringBitmap,
}

impl ScopeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of indexed cards.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of distinct tags with at least one member.
    pub fn tag_count(&self) -> usize {
        self.tag_bitmaps.len()
    }

    /// Index a card's current tag set.
    ///
    /// Two phases, never interleaved: first the card's stale memberships
    /// are removed, then its current tags are added. Calling this for a
    /// brand-new card is fine; the removal phase is a no-op.
    pub fn upsert_card(&mut self, card: &Card) {
        self.remove_card(&card.id);
        let position = card.position();
        for &bit in &card.tag_bitmaps {
            self.tag_bitmaps
                .entry(bit)
                .or_insert_with(RoaringBitmap::new)
                .insert(position);
        }
        self.all_cards.insert(position);
        self.records.insert(
            position,
            CardEntry {
                id: card.id.clone(),
                tag_bits: card.tag_bitmaps.clone(),
            },
        );
    }

    /// Drop a card from every bitmap it belongs to.
    pub fn remove_card(&mut self, card_id: &str) {
        let position = derive_card_position(card_id);
        // Another card may own this position after a hash collision;
        // only the recorded owner gets to clear it.
        match self.records.get(&position) {
            Some(entry) if entry.id == card_id => {}
            _ => return,
        }
        if let Some(entry) = self.records.remove(&position) {
            for bit in entry.tag_bits {
                if let Some(bm) = self.tag_bitmaps.get_mut(&bit) {
                    bm.remove(position);
                    if bm.is_empty() {
                        self.tag_bitmaps.remove(&bit);
                    }
                }
            }
        }
        self.all_cards.remove(position);
    }

    /// Positions of cards carrying every tag in `required`.
    ///
    /// Empty `required` returns every indexed card. A tag with no members
    /// short-circuits to an empty result: "no such tag" means "no
    /// matches", never an error. Intersection runs smallest bitmap first.
    pub fn cards_matching(&self, required: &[u32]) -> RoaringBitmap {
        if required.is_empty() {
            return self.all_cards.clone();
        }
        let mut sets: Vec<&RoaringBitmap> = Vec::with_capacity(required.len());
        for bit in required {
            match self.tag_bitmaps.get(bit) {
                Some(bm) => sets.push(bm),
                None => return RoaringBitmap::new(),
            }
        }
        sets.sort_by_key(|bm| bm.len());
        let mut iter = sets.into_iter();
        let mut acc = iter.next().cloned().unwrap_or_default();
        for bm in iter {
            acc &= bm;
            if acc.is_empty() {
                break;
            }
        }
        acc
    }

    /// Evaluate a full filter against the maintained bitmaps.
    ///
    /// Same contract as `setops::execute`, but reuses the incrementally
    /// maintained per-tag bitmaps instead of rebuilding them per query.
    /// This is the compressed-bitmap execution path in production.
    pub fn execute_filter(&self, filter: &BitFilter) -> Vec<u32> {
        let mut acc = self.cards_matching(&filter.required);
        if !filter.any_of.is_empty() {
            let mut any = RoaringBitmap::new();
            for bit in &filter.any_of {
                if let Some(bm) = self.tag_bitmaps.get(bit) {
                    any |= bm;
                }
            }
            acc &= any;
        }
        if !filter.exclude.is_empty() {
            for bit in &filter.exclude {
                if let Some(bm) = self.tag_bitmaps.get(bit) {
                    acc -= bm;
                }
            }
        }
        acc.iter().collect()
    }

    /// Snapshot the membership facts for the pure execution modes,
    /// ordered by position.
    pub fn universe(&self) -> Vec<UniverseRecord> {
        let mut records: Vec<UniverseRecord> = self
            .records
            .iter()
            .map(|(&position, entry)| UniverseRecord::new(position, entry.tag_bits.clone()))
            .collect();
        records.sort_unstable_by_key(|rec| rec.position);
        records
    }

    /// Map positions back to card ids, in the order given.
    pub fn resolve(&self, positions: &[u32]) -> Vec<String> {
        positions
            .iter()
            .filter_map(|pos| self.records.get(pos).map(|entry| entry.id.clone()))
            .collect()
    }
}

/// All scope indexes, behind one reader-writer lock.
///
/// Built at store startup; rebuilds construct a fresh `ScopeIndex` off to
/// the side and swap it in under the write lock so readers never observe
/// a half-built index.
#[derive(Debug, Default)]
pub struct IndexRegistry {
    scopes: RwLock<HashMap<ScopeKey, ScopeIndex>>,
}

impl IndexRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace (or install) the index for one scope.
    pub fn replace_scope(&self, scope: ScopeKey, index: ScopeIndex) -> CardboxResult<()> {
        let mut scopes = self
            .scopes
            .write()
            .map_err(|_| StorageError::LockPoisoned { what: "index registry" })?;
        tracing::debug!(
            scope = %scope,
            cards = index.len(),
            tags = index.tag_count(),
            "scope index installed"
        );
        scopes.insert(scope, index);
        Ok(())
    }

    /// Apply a card mutation to its scope's index, creating the scope on
    /// first touch.
    pub fn upsert_card(&self, card: &Card) -> CardboxResult<()> {
        let mut scopes = self
            .scopes
            .write()
            .map_err(|_| StorageError::LockPoisoned { what: "index registry" })?;
        scopes
            .entry(card.scope.clone())
            .or_default()
            .upsert_card(card);
        Ok(())
    }

    /// Remove a card from its scope's index.
    pub fn remove_card(&self, scope: &ScopeKey, card_id: &str) -> CardboxResult<()> {
        let mut scopes = self
            .scopes
            .write()
            .map_err(|_| StorageError::LockPoisoned { what: "index registry" })?;
        if let Some(index) = scopes.get_mut(scope) {
            index.remove_card(card_id);
        }
        Ok(())
    }

    /// Run a closure against one scope's index under the read lock.
    ///
    /// Yields `None` when the scope has never been indexed; callers treat
    /// that as an empty scope.
    pub fn with_scope<R>(
        &self,
        scope: &ScopeKey,
        f: impl FnOnce(&ScopeIndex) -> R,
    ) -> CardboxResult<Option<R>> {
        let scopes = self
            .scopes
            .read()
            .map_err(|_| StorageError::LockPoisoned { what: "index registry" })?;
        Ok(scopes.get(scope).map(f))
    }

    /// Number of scopes currently indexed.
    pub fn scope_count(&self) -> CardboxResult<usize> {
        let scopes = self
            .scopes
            .read()
            .map_err(|_| StorageError::LockPoisoned { what: "index registry" })?;
        Ok(scopes.len())
    }
}

#[cfg(test)]
mod tests {
    use cardbox_core::scope::{UserId, WorkspaceId};

    use super::*;

    fn scope() -> ScopeKey {
        ScopeKey::new(WorkspaceId::new("idx"), UserId::new("u")).unwrap()
    }

    fn card(tags: &[&str]) -> Card {
        Card::new(
            scope(),
            "c",
            "",
            tags.iter().map(|t| t.to_string()).collect(),
        )
    }

    #[test]
    fn upsert_then_remove_leaves_index_empty() {
        let mut index = ScopeIndex::new();
        let c = card(&["a", "b"]);
        index.upsert_card(&c);
        assert_eq!(index.len(), 1);
        assert_eq!(index.tag_count(), 2);

        index.remove_card(&c.id);
        assert!(index.is_empty());
        assert_eq!(index.tag_count(), 0, "empty bitmaps are dropped");
    }

    #[test]
    fn reupsert_moves_membership_not_duplicates_it() {
        let mut index = ScopeIndex::new();
        let mut c = card(&["a"]);
        index.upsert_card(&c);
        c.set_tags(vec!["b".into()]);
        index.upsert_card(&c);

        let ws = c.scope.workspace.clone();
        let a = cardbox_core::model::bitmap::derive_tag_bitmap(&ws, "a");
        let b = cardbox_core::model::bitmap::derive_tag_bitmap(&ws, "b");
        assert!(index.cards_matching(&[a]).is_empty());
        assert_eq!(index.cards_matching(&[b]).len(), 1);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn unknown_tag_short_circuits_to_empty() {
        let mut index = ScopeIndex::new();
        index.upsert_card(&card(&["a"]));
        assert!(index.cards_matching(&[0xDEAD]).is_empty());
    }

    #[test]
    fn empty_required_returns_all_cards_even_untagged() {
        let mut index = ScopeIndex::new();
        index.upsert_card(&card(&["a"]));
        index.upsert_card(&card(&[]));
        assert_eq!(index.cards_matching(&[]).len(), 2);
    }

    #[test]
    fn registry_with_scope_returns_none_for_unknown_scope() {
        let registry = IndexRegistry::new();
        assert!(registry
            .with_scope(&scope(), |idx| idx.len())
            .unwrap()
            .is_none());
        registry.upsert_card(&card(&["a"])).unwrap();
        assert_eq!(
            registry.with_scope(&scope(), |idx| idx.len()).unwrap(),
            Some(1)
        );
    }
}
