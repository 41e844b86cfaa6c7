use serde::{Deserialize, Serialize};

use crate::errors::SyncError;
use crate::model::{Card, Tag};

/// Privacy-preserving projection of a card or tag for remote mirroring.
///
/// The mirror never sees names, descriptions, or owner identifiers. Only
/// bitmap-shaped data crosses the wire: enough for a remote to rebuild
/// membership structure, nothing to rebuild content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorPayload {
    /// Card UUID or derived tag id.
    pub entity_id: String,
    /// The card's bitmap position; `None` for tag payloads.
    pub card_bitmap: Option<u32>,
    /// Bitmap values of the entity's tags (a single element for a tag).
    pub tag_bitmaps: Vec<u32>,
    /// blake3 checksum over the bitmap fields and version.
    pub checksum: String,
    /// Monotonic version for idempotent upserts.
    pub sync_version: u64,
}

impl MirrorPayload {
    /// Project a card down to its mirrorable fields.
    pub fn for_card(card: &Card) -> Self {
        let card_bitmap = Some(card.position());
        let tag_bitmaps = card.tag_bitmaps.clone();
        let checksum = Self::compute_checksum(card_bitmap, &tag_bitmaps, card.sync_version);
        Self {
            entity_id: card.id.clone(),
            card_bitmap,
            tag_bitmaps,
            checksum,
            sync_version: card.sync_version,
        }
    }

    /// Project a tag down to its mirrorable fields.
    pub fn for_tag(tag: &Tag) -> Self {
        let tag_bitmaps = vec![tag.bitmap];
        let checksum = Self::compute_checksum(None, &tag_bitmaps, tag.sync_version);
        Self {
            entity_id: tag.id.clone(),
            card_bitmap: None,
            tag_bitmaps,
            checksum,
            sync_version: tag.sync_version,
        }
    }

    /// Recompute the checksum and compare against the carried one.
    pub fn verify(&self) -> bool {
        self.checksum == self.expected_checksum()
    }

    /// The checksum the carried fields should hash to.
    pub fn expected_checksum(&self) -> String {
        Self::compute_checksum(self.card_bitmap, &self.tag_bitmaps, self.sync_version)
    }

    fn compute_checksum(card_bitmap: Option<u32>, tag_bitmaps: &[u32], sync_version: u64) -> String {
        let mut hasher = blake3::Hasher::new();
        match card_bitmap {
            Some(v) => {
                hasher.update(&[1]);
                hasher.update(&v.to_le_bytes());
            }
            None => {
                hasher.update(&[0]);
            }
        }
        for bitmap in tag_bitmaps {
            hasher.update(&bitmap.to_le_bytes());
        }
        hasher.update(&sync_version.to_le_bytes());
        hasher.finalize().to_hex().to_string()
    }
}

/// Transport boundary for the hybrid strategy's remote side.
///
/// Implementations must be cheap to probe: `can_sync` is called on every
/// drain sweep and must not block on network I/O when the answer is
/// already known.
pub trait RemoteMirror: Send + Sync {
    /// Whether the mirror is currently reachable.
    fn can_sync(&self) -> bool;
    /// Create or replace a card projection.
    fn upsert_card(&self, payload: &MirrorPayload) -> Result<(), SyncError>;
    /// Create or replace a tag projection.
    fn upsert_tag(&self, payload: &MirrorPayload) -> Result<(), SyncError>;
    /// Remove a card projection.
    fn delete_card(&self, entity_id: &str) -> Result<(), SyncError>;
}
