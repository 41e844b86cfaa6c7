use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::bitmap::{derive_card_position, derive_tag_bitmap, derive_tag_id};
use crate::constants::BITMAP_VALUE_MASK;
use crate::errors::ValidationError;
use crate::scope::ScopeKey;

/// The primary content unit: a named, described item carrying an ordered
/// set of tag references.
///
/// `tags` is the authored field; `tag_ids` and `tag_bitmaps` are derived
/// projections kept in lock-step by construction. Mutate the tag set only
/// through [`Card::set_tags`] so the three lists never diverge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    /// UUID v4 identifier.
    pub id: String,
    /// Isolation scope.
    pub scope: ScopeKey,
    /// Display name.
    pub name: String,
    /// Free-form body. Encrypted at rest when the store has a content key.
    pub description: String,
    /// Ordered tag names as authored. Deduplicated, first occurrence wins.
    pub tags: Vec<String>,
    /// Derived tag identifiers, one per entry in `tags`.
    pub tag_ids: Vec<String>,
    /// Derived 31-bit index keys, one per entry in `tags`.
    pub tag_bitmaps: Vec<u32>,
    /// Monotonic counter bumped on every mirrored mutation.
    pub sync_version: u64,
    /// Creation time.
    pub created: DateTime<Utc>,
    /// Last modification time.
    pub modified: DateTime<Utc>,
    /// Soft-delete marker.
    pub deleted: Option<DateTime<Utc>>,
}

impl Card {
    /// Create a card with a fresh UUID and a normalized tag set.
    pub fn new(
        scope: ScopeKey,
        name: impl Into<String>,
        description: impl Into<String>,
        tags: Vec<String>,
    ) -> Self {
        let now = Utc::now();
        let mut card = Self {
            id: uuid::Uuid::new_v4().to_string(),
            scope,
            name: name.into(),
            description: description.into(),
            tags: Vec::new(),
            tag_ids: Vec::new(),
            tag_bitmaps: Vec::new(),
            sync_version: 0,
            created: now,
            modified: now,
            deleted: None,
        };
        card.apply_tags(tags);
        card
    }

    /// Replace the tag set and refresh the derived projections.
    pub fn set_tags(&mut self, tags: Vec<String>) {
        self.apply_tags(tags);
        self.touch();
    }

    fn apply_tags(&mut self, tags: Vec<String>) {
        let mut seen = std::collections::HashSet::new();
        let normalized: Vec<String> = tags
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty() && seen.insert(t.clone()))
            .collect();
        self.tag_ids = normalized
            .iter()
            .map(|name| derive_tag_id(&self.scope.workspace, name))
            .collect();
        self.tag_bitmaps = normalized
            .iter()
            .map(|name| derive_tag_bitmap(&self.scope.workspace, name))
            .collect();
        self.tags = normalized;
    }

    /// The stable 31-bit position this card occupies in every tag bitmap.
    pub fn position(&self) -> u32 {
        derive_card_position(&self.id)
    }

    /// Bump the modification timestamp.
    pub fn touch(&mut self) {
        self.modified = Utc::now();
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted.is_some()
    }

    /// Soft-delete: set the deletion timestamp, keep the row.
    pub fn mark_deleted(&mut self) {
        let now = Utc::now();
        self.deleted = Some(now);
        self.modified = now;
    }

    /// Check that the derived projections still match the authored tags.
    ///
    /// Rows deserialized from storage pass through this before they are
    /// trusted by the index.
    pub fn check_projection(&self) -> Result<(), ValidationError> {
        if let Some(&value) = self.tag_bitmaps.iter().find(|&&b| b > BITMAP_VALUE_MASK) {
            return Err(ValidationError::BitmapOutOfRange {
                value: value as u64,
            });
        }
        if self.tag_ids.len() != self.tags.len() || self.tag_bitmaps.len() != self.tags.len() {
            return Err(ValidationError::DivergentProjection {
                card_id: self.id.clone(),
                reason: format!(
                    "lengths diverge: {} tags, {} ids, {} bitmaps",
                    self.tags.len(),
                    self.tag_ids.len(),
                    self.tag_bitmaps.len()
                ),
            });
        }
        for (i, name) in self.tags.iter().enumerate() {
            if self.tag_ids[i] != derive_tag_id(&self.scope.workspace, name) {
                return Err(ValidationError::DivergentProjection {
                    card_id: self.id.clone(),
                    reason: format!("tag id for {name:?} does not match its derivation"),
                });
            }
            if self.tag_bitmaps[i] != derive_tag_bitmap(&self.scope.workspace, name) {
                return Err(ValidationError::DivergentProjection {
                    card_id: self.id.clone(),
                    reason: format!("bitmap for {name:?} does not match its derivation"),
                });
            }
        }
        Ok(())
    }

    /// Structural comparison across all user-visible fields.
    ///
    /// Distinct from `PartialEq`, which only compares IDs (DDD Entity
    /// pattern).
    pub fn content_eq(&self, other: &Self) -> bool {
        self.scope == other.scope
            && self.name == other.name
            && self.description == other.description
            && self.tags == other.tags
            && self.deleted.is_some() == other.deleted.is_some()
    }
}

/// Identity equality: two cards are equal if they have the same ID.
impl PartialEq for Card {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Card {}
