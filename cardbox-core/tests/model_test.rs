use cardbox_core::errors::ValidationError;
use cardbox_core::model::bitmap::{derive_card_position, derive_tag_bitmap, derive_tag_id};
use cardbox_core::model::{Card, Tag};
use cardbox_core::scope::{ScopeKey, UserId, WorkspaceId};

fn scope() -> ScopeKey {
    ScopeKey::new(WorkspaceId::new("acme"), UserId::new("u-1")).unwrap()
}

// --- Derivations ---

#[test]
fn tag_bitmap_is_deterministic_and_31_bit() {
    let ws = WorkspaceId::new("acme");
    let first = derive_tag_bitmap(&ws, "urgent");
    let second = derive_tag_bitmap(&WorkspaceId::new("acme"), "urgent");
    assert_eq!(first, second);
    assert!(first < (1 << 31));
}

#[test]
fn tag_bitmap_differs_across_workspaces() {
    assert_ne!(
        derive_tag_bitmap(&WorkspaceId::new("acme"), "urgent"),
        derive_tag_bitmap(&WorkspaceId::new("globex"), "urgent"),
    );
}

#[test]
fn tag_id_is_32_hex_chars() {
    let id = derive_tag_id(&WorkspaceId::new("acme"), "urgent");
    assert_eq!(id.len(), 32);
    assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn workspace_name_boundary_is_unambiguous() {
    // ("ab", "c") must not collide with ("a", "bc").
    assert_ne!(
        derive_tag_id(&WorkspaceId::new("ab"), "c"),
        derive_tag_id(&WorkspaceId::new("a"), "bc"),
    );
}

#[test]
fn card_position_is_deterministic_and_31_bit() {
    let pos = derive_card_position("some-card-uuid");
    assert_eq!(pos, derive_card_position("some-card-uuid"));
    assert!(pos < (1 << 31));
}

// --- Card ---

#[test]
fn new_card_keeps_projections_in_lock_step() {
    let card = Card::new(
        scope(),
        "groceries",
        "weekly list",
        vec!["home".into(), "food".into()],
    );
    assert_eq!(card.tags, vec!["home", "food"]);
    assert_eq!(card.tag_ids.len(), 2);
    assert_eq!(card.tag_bitmaps.len(), 2);
    card.check_projection().unwrap();
    assert_eq!(
        card.tag_bitmaps[0],
        derive_tag_bitmap(&card.scope.workspace, "home")
    );
}

#[test]
fn card_tags_are_deduplicated_first_occurrence_wins() {
    let card = Card::new(
        scope(),
        "c",
        "",
        vec!["a".into(), "b".into(), "a".into(), " b ".into()],
    );
    assert_eq!(card.tags, vec!["a", "b"]);
}

#[test]
fn card_tags_drop_empty_entries() {
    let card = Card::new(scope(), "c", "", vec!["".into(), "  ".into(), "x".into()]);
    assert_eq!(card.tags, vec!["x"]);
}

#[test]
fn set_tags_refreshes_projections_and_touches() {
    let mut card = Card::new(scope(), "c", "", vec!["a".into()]);
    let before = card.modified;
    card.set_tags(vec!["b".into(), "c".into()]);
    assert_eq!(card.tags, vec!["b", "c"]);
    card.check_projection().unwrap();
    assert!(card.modified >= before);
}

#[test]
fn check_projection_rejects_tampered_bitmaps() {
    let mut card = Card::new(scope(), "c", "", vec!["a".into()]);
    card.tag_bitmaps[0] ^= 1;
    assert!(card.check_projection().is_err());
}

#[test]
fn check_projection_rejects_diverged_lengths() {
    let mut card = Card::new(scope(), "c", "", vec!["a".into()]);
    card.tag_ids.pop();
    assert!(card.check_projection().is_err());
}

#[test]
fn check_projection_rejects_bitmaps_past_31_bits() {
    let mut card = Card::new(scope(), "c", "", vec!["a".into()]);
    card.tag_bitmaps[0] = 1 << 31;
    assert!(matches!(
        card.check_projection(),
        Err(ValidationError::BitmapOutOfRange { value }) if value == 1 << 31
    ));
}

#[test]
fn card_equality_is_identity_not_content() {
    let a = Card::new(scope(), "same", "same", vec![]);
    let b = Card::new(scope(), "same", "same", vec![]);
    assert_ne!(a, b, "distinct UUIDs mean distinct cards");
    assert!(a.content_eq(&b), "but the content matches");

    let mut renamed = a.clone();
    renamed.name = "other".into();
    assert_eq!(a, renamed, "same id still equal");
    assert!(!a.content_eq(&renamed));
}

#[test]
fn mark_deleted_sets_timestamp_once() {
    let mut card = Card::new(scope(), "c", "", vec![]);
    assert!(!card.is_deleted());
    card.mark_deleted();
    assert!(card.is_deleted());
}

#[test]
fn card_serde_roundtrip_preserves_projections() {
    let card = Card::new(scope(), "c", "body", vec!["a".into(), "b".into()]);
    let json = serde_json::to_string(&card).unwrap();
    let back: Card = serde_json::from_str(&json).unwrap();
    assert_eq!(back, card);
    assert!(back.content_eq(&card));
    assert_eq!(back.tag_bitmaps, card.tag_bitmaps);
    back.check_projection().unwrap();
}

// --- Tag ---

#[test]
fn new_tag_starts_at_zero_count_with_derived_fields() {
    let tag = Tag::new(scope(), "urgent");
    assert_eq!(tag.card_count, 0);
    assert_eq!(tag.id, derive_tag_id(&tag.scope.workspace, "urgent"));
    assert_eq!(tag.bitmap, derive_tag_bitmap(&tag.scope.workspace, "urgent"));
    assert!(!tag.is_deleted());
}

#[test]
fn card_and_tag_agree_on_bitmap_for_same_name() {
    let card = Card::new(scope(), "c", "", vec!["urgent".into()]);
    let tag = Tag::new(scope(), "urgent");
    assert_eq!(card.tag_bitmaps[0], tag.bitmap);
    assert_eq!(card.tag_ids[0], tag.id);
}
