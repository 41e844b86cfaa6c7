//! Deterministic bitmap and identifier derivation.
//!
//! Tags and card positions are keyed by hashes, not by a central sequence,
//! so any node can compute a tag's index key or a card's bitmap position
//! from names alone, before the corresponding row exists and across
//! process restarts.
//!
//! # Examples
//!
//! ```
//! use cardbox_core::model::bitmap::{derive_tag_bitmap, derive_tag_id};
//! use cardbox_core::scope::WorkspaceId;
//!
//! let ws = WorkspaceId::new("acme");
//! let a = derive_tag_bitmap(&ws, "urgent");
//! let b = derive_tag_bitmap(&ws, "urgent");
//! assert_eq!(a, b);
//! assert!(a < 1 << 31);
//! assert_ne!(derive_tag_id(&ws, "urgent"), derive_tag_id(&ws, "later"));
//! ```

use crate::constants::BITMAP_VALUE_MASK;
use crate::scope::WorkspaceId;

/// Byte separating workspace and name inside the hash input, so that
/// ("ab", "c") and ("a", "bc") hash differently.
const SCOPE_SEPARATOR: u8 = 0x1f;

fn tag_digest(workspace: &WorkspaceId, name: &str) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(workspace.as_str().as_bytes());
    hasher.update(&[SCOPE_SEPARATOR]);
    hasher.update(name.as_bytes());
    hasher.finalize()
}

fn low_bits(digest: &blake3::Hash) -> u32 {
    let b = digest.as_bytes();
    u32::from_le_bytes([b[0], b[1], b[2], b[3]]) & BITMAP_VALUE_MASK
}

/// Derive a tag's stable identifier from its workspace and name.
///
/// First 16 bytes of the blake3 digest, hex-encoded. Deterministic, so a
/// tag reference can be formed before the tag row exists.
pub fn derive_tag_id(workspace: &WorkspaceId, name: &str) -> String {
    tag_digest(workspace, name).to_hex()[..32].to_string()
}

/// Derive a tag's 31-bit bitmap value from its workspace and name.
///
/// First 4 digest bytes, little-endian, masked to 31 bits. With hash-derived
/// values two tags can collide; the birthday bound makes that likely only
/// past roughly 2^15 distinct tags per workspace. A collision merges the two
/// tags' index bitmaps; per-tag counters are unaffected because they key on
/// the full tag id.
pub fn derive_tag_bitmap(workspace: &WorkspaceId, name: &str) -> u32 {
    low_bits(&tag_digest(workspace, name))
}

/// Encode a card identifier into its stable 31-bit bitmap position.
///
/// Two cards can hash to the same position; index lookups are
/// last-writer-wins for such pairs. Acceptable at the cardinalities this
/// store targets.
pub fn derive_card_position(card_id: &str) -> u32 {
    low_bits(&blake3::hash(card_id.as_bytes()))
}
