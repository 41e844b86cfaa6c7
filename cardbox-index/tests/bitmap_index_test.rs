//! Index maintenance: build, two-phase update on save, scope isolation,
//! and agreement between the maintained bitmaps and the pure engine.

use cardbox_core::exec::ExecMode;
use cardbox_core::model::bitmap::derive_tag_bitmap;
use cardbox_core::model::Card;
use cardbox_core::scope::{ScopeKey, UserId, WorkspaceId};
use cardbox_index::setops::{execute, BitFilter};
use cardbox_index::{IndexRegistry, ScopeIndex};

fn scope(ws: &str) -> ScopeKey {
    ScopeKey::new(WorkspaceId::new(ws), UserId::new("u-1")).unwrap()
}

fn card(ws: &str, tags: &[&str]) -> Card {
    Card::new(
        scope(ws),
        "c",
        "",
        tags.iter().map(|t| t.to_string()).collect(),
    )
}

fn bit(ws: &str, name: &str) -> u32 {
    derive_tag_bitmap(&WorkspaceId::new(ws), name)
}

#[test]
fn build_from_cards_then_query() {
    let mut index = ScopeIndex::new();
    let cards = [
        card("w", &["red", "big"]),
        card("w", &["red"]),
        card("w", &["blue"]),
    ];
    for c in &cards {
        index.upsert_card(c);
    }

    let red = index.cards_matching(&[bit("w", "red")]);
    assert_eq!(red.len(), 2);
    let red_big = index.cards_matching(&[bit("w", "red"), bit("w", "big")]);
    assert_eq!(red_big.len(), 1);
    assert!(red_big.contains(cards[0].position()));
}

#[test]
fn save_with_changed_tags_is_remove_then_add() {
    let mut index = ScopeIndex::new();
    let mut c = card("w", &["a", "b"]);
    index.upsert_card(&c);

    c.set_tags(vec!["b".into(), "c".into()]);
    index.upsert_card(&c);

    assert!(index.cards_matching(&[bit("w", "a")]).is_empty());
    assert_eq!(index.cards_matching(&[bit("w", "b")]).len(), 1);
    assert_eq!(index.cards_matching(&[bit("w", "c")]).len(), 1);
    assert_eq!(index.len(), 1, "still one card, membership moved");
}

#[test]
fn empty_scope_empty_bitmap() {
    let index = ScopeIndex::new();
    assert!(index.cards_matching(&[]).is_empty());
    assert!(index.cards_matching(&[123]).is_empty());
}

#[test]
fn resolve_maps_positions_back_to_ids() {
    let mut index = ScopeIndex::new();
    let c = card("w", &["x"]);
    index.upsert_card(&c);
    let positions: Vec<u32> = index.cards_matching(&[bit("w", "x")]).iter().collect();
    assert_eq!(index.resolve(&positions), vec![c.id.clone()]);
}

#[test]
fn execute_filter_agrees_with_pure_engine_on_every_mode() {
    let mut index = ScopeIndex::new();
    let mut cards = vec![
        card("w", &["red", "big"]),
        card("w", &["red", "small"]),
        card("w", &["blue", "big"]),
        card("w", &["green"]),
        card("w", &[]),
    ];
    for c in &cards {
        index.upsert_card(c);
    }
    // Mutate one card so the maintained bitmaps have seen an update.
    cards[3].set_tags(vec!["red".into(), "big".into()]);
    index.upsert_card(&cards[3]);

    let filters = [
        BitFilter::default(),
        BitFilter {
            required: vec![bit("w", "red")],
            ..BitFilter::default()
        },
        BitFilter {
            required: vec![bit("w", "red"), bit("w", "big")],
            ..BitFilter::default()
        },
        BitFilter {
            any_of: vec![bit("w", "blue"), bit("w", "small")],
            ..BitFilter::default()
        },
        BitFilter {
            required: vec![bit("w", "red")],
            any_of: vec![bit("w", "big"), bit("w", "small")],
            exclude: vec![bit("w", "blue")],
        },
        BitFilter {
            exclude: vec![bit("w", "red")],
            ..BitFilter::default()
        },
    ];

    let universe = index.universe();
    for filter in &filters {
        let maintained = index.execute_filter(filter);
        for mode in ExecMode::ALL {
            assert_eq!(
                execute(mode, filter, &universe),
                maintained,
                "mode {mode} vs maintained bitmaps, filter {filter:?}"
            );
        }
    }
}

#[test]
fn registry_isolates_workspaces() {
    let registry = IndexRegistry::new();
    registry.upsert_card(&card("acme", &["shared-name"])).unwrap();
    registry.upsert_card(&card("globex", &["shared-name"])).unwrap();

    let acme_hits = registry
        .with_scope(&scope("acme"), |idx| {
            idx.cards_matching(&[bit("acme", "shared-name")]).len()
        })
        .unwrap();
    assert_eq!(acme_hits, Some(1));

    // Same tag name hashes differently in another workspace, and the
    // scopes are distinct registry entries either way.
    let cross = registry
        .with_scope(&scope("acme"), |idx| {
            idx.cards_matching(&[bit("globex", "shared-name")]).len()
        })
        .unwrap();
    assert_eq!(cross, Some(0));
}

#[test]
fn registry_replace_scope_swaps_wholesale() {
    let registry = IndexRegistry::new();
    registry.upsert_card(&card("w", &["old"])).unwrap();

    let mut fresh = ScopeIndex::new();
    fresh.upsert_card(&card("w", &["new"]));
    registry.replace_scope(scope("w"), fresh).unwrap();

    let old_count = registry
        .with_scope(&scope("w"), |idx| idx.cards_matching(&[bit("w", "old")]).len())
        .unwrap();
    assert_eq!(old_count, Some(0));
    let new_count = registry
        .with_scope(&scope("w"), |idx| idx.cards_matching(&[bit("w", "new")]).len())
        .unwrap();
    assert_eq!(new_count, Some(1));
}
