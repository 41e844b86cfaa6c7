//! Property tests: derivation determinism, range bounds, projection lock-step.

use proptest::prelude::*;

use cardbox_core::model::bitmap::{derive_card_position, derive_tag_bitmap, derive_tag_id};
use cardbox_core::model::Card;
use cardbox_core::scope::{ScopeKey, UserId, WorkspaceId};

proptest! {
    #[test]
    fn prop_tag_bitmap_below_2_pow_31(
        ws in "[a-z0-9-]{1,20}",
        name in "[a-zA-Z0-9 _-]{1,40}"
    ) {
        let bitmap = derive_tag_bitmap(&WorkspaceId::new(ws), &name);
        prop_assert!(bitmap < (1u32 << 31));
    }

    #[test]
    fn prop_tag_derivations_are_pure(
        ws in "[a-z0-9-]{1,20}",
        name in "[a-zA-Z0-9 _-]{1,40}"
    ) {
        let workspace = WorkspaceId::new(ws.clone());
        prop_assert_eq!(
            derive_tag_bitmap(&workspace, &name),
            derive_tag_bitmap(&WorkspaceId::new(ws.clone()), &name)
        );
        prop_assert_eq!(
            derive_tag_id(&workspace, &name),
            derive_tag_id(&WorkspaceId::new(ws), &name)
        );
    }

    #[test]
    fn prop_card_position_below_2_pow_31(id in "[a-f0-9-]{8,36}") {
        prop_assert!(derive_card_position(&id) < (1u32 << 31));
    }

    #[test]
    fn prop_card_projections_stay_in_lock_step(
        tags in proptest::collection::vec("[a-zA-Z0-9]{1,12}", 0..8)
    ) {
        let scope = ScopeKey::new(WorkspaceId::new("prop"), UserId::new("u")).unwrap();
        let card = Card::new(scope, "c", "", tags);
        prop_assert_eq!(card.tags.len(), card.tag_ids.len());
        prop_assert_eq!(card.tags.len(), card.tag_bitmaps.len());
        prop_assert!(card.check_projection().is_ok());
    }

    #[test]
    fn prop_set_tags_is_idempotent(
        tags in proptest::collection::vec("[a-zA-Z0-9]{1,12}", 0..8)
    ) {
        let scope = ScopeKey::new(WorkspaceId::new("prop"), UserId::new("u")).unwrap();
        let mut card = Card::new(scope, "c", "", tags);
        let once = card.tags.clone();
        card.set_tags(once.clone());
        prop_assert_eq!(card.tags, once);
    }
}
