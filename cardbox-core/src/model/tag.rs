use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::bitmap::{derive_tag_bitmap, derive_tag_id};
use crate::scope::ScopeKey;

/// A named label attachable to cards, unique per workspace.
///
/// Tags come into existence on first reference from a card; they are never
/// authored directly. `card_count` is denormalized and maintained
/// transactionally alongside card mutations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    /// Deterministic identifier derived from (workspace, name).
    pub id: String,
    /// Isolation scope.
    pub scope: ScopeKey,
    /// Tag name, unique within the workspace.
    pub name: String,
    /// Derived 31-bit index key.
    pub bitmap: u32,
    /// Number of non-deleted cards in the workspace carrying this tag.
    pub card_count: u64,
    /// Monotonic counter bumped on every mirrored mutation.
    pub sync_version: u64,
    /// Creation time.
    pub created: DateTime<Utc>,
    /// Last modification time.
    pub modified: DateTime<Utc>,
    /// Soft-delete marker.
    pub deleted: Option<DateTime<Utc>>,
}

impl Tag {
    /// Materialize a tag from its first reference. Count starts at zero;
    /// the referencing mutation increments it in the same transaction.
    pub fn new(scope: ScopeKey, name: impl Into<String>) -> Self {
        let name = name.into();
        let now = Utc::now();
        Self {
            id: derive_tag_id(&scope.workspace, &name),
            bitmap: derive_tag_bitmap(&scope.workspace, &name),
            scope,
            name,
            card_count: 0,
            sync_version: 0,
            created: now,
            modified: now,
            deleted: None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted.is_some()
    }
}

/// Identity equality: two tags are equal if they have the same ID.
impl PartialEq for Tag {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Tag {}
