//! End-to-end store behavior: filter shapes, scope isolation, soft
//! deletion, tag listings, and index rebuild across restarts.

use std::sync::Arc;

use cardbox_adaptive::PerfTracker;
use cardbox_core::config::{AdaptiveConfig, StorageConfig};
use cardbox_core::errors::CardboxError;
use cardbox_core::model::Card;
use cardbox_core::scope::{ScopeKey, UserId, WorkspaceId};
use cardbox_core::traits::{CardStore, TagFilter};
use cardbox_storage::LocalStore;

fn tracker() -> Arc<PerfTracker> {
    Arc::new(PerfTracker::new(AdaptiveConfig::default()))
}

fn store() -> LocalStore {
    LocalStore::open_in_memory(&StorageConfig::default(), tracker()).unwrap()
}

fn scope(ws: &str, owner: &str) -> ScopeKey {
    ScopeKey::new(WorkspaceId::new(ws), UserId::new(owner)).unwrap()
}

fn card(scope: &ScopeKey, name: &str, tags: &[&str]) -> Card {
    Card::new(
        scope.clone(),
        name,
        format!("{name} description"),
        tags.iter().map(|t| t.to_string()).collect(),
    )
}

fn names(cards: &[Card]) -> Vec<&str> {
    cards.iter().map(|c| c.name.as_str()).collect()
}

// ── Save and fetch ────────────────────────────────────────────────────────

#[test]
fn save_then_fetch_round_trips_every_field() {
    let store = store();
    let scope = scope("w", "u");
    let saved = card(&scope, "alpha", &["red", "big"]);

    store.save_card(&saved).unwrap();
    let loaded = store.card_by_id(&scope, &saved.id).unwrap();

    assert_eq!(loaded.name, "alpha");
    assert_eq!(loaded.description, "alpha description");
    assert_eq!(loaded.tags, vec!["red", "big"]);
    assert_eq!(loaded.tag_ids, saved.tag_ids);
    assert_eq!(loaded.tag_bitmaps, saved.tag_bitmaps);
    assert_eq!(loaded.sync_version, 0);
    assert!(loaded.deleted.is_none());
}

#[test]
fn missing_card_is_not_found() {
    let store = store();
    let err = store.card_by_id(&scope("w", "u"), "nope").unwrap_err();
    assert!(matches!(err, CardboxError::CardNotFound { .. }));
}

#[test]
fn deleted_card_is_not_found() {
    let store = store();
    let scope = scope("w", "u");
    let c = card(&scope, "gone", &["red"]);
    store.save_card(&c).unwrap();
    store.delete_card(&scope, &c.id).unwrap();

    let err = store.card_by_id(&scope, &c.id).unwrap_err();
    assert!(matches!(err, CardboxError::CardNotFound { .. }));
}

#[test]
fn deleting_twice_is_not_found() {
    let store = store();
    let scope = scope("w", "u");
    let c = card(&scope, "once", &[]);
    store.save_card(&c).unwrap();
    store.delete_card(&scope, &c.id).unwrap();

    let err = store.delete_card(&scope, &c.id).unwrap_err();
    assert!(matches!(err, CardboxError::CardNotFound { .. }));
}

// ── Filter shapes ─────────────────────────────────────────────────────────

fn seeded_store() -> (LocalStore, ScopeKey) {
    let store = store();
    let scope = scope("w", "u");
    for (name, tags) in [
        ("red-big", &["red", "big"] as &[&str]),
        ("red-small", &["red", "small"]),
        ("blue-big", &["blue", "big"]),
        ("plain", &[]),
    ] {
        store.save_card(&card(&scope, name, tags)).unwrap();
    }
    (store, scope)
}

#[test]
fn empty_filter_lists_every_live_card() {
    let (store, scope) = seeded_store();
    let all = store.cards_by_tags(&scope, &TagFilter::all()).unwrap();
    assert_eq!(
        names(&all),
        vec!["red-big", "red-small", "blue-big", "plain"]
    );
}

#[test]
fn required_narrows_to_cards_carrying_every_tag() {
    let (store, scope) = seeded_store();
    let red = store
        .cards_by_tags(&scope, &TagFilter::required(["red"]))
        .unwrap();
    assert_eq!(names(&red), vec!["red-big", "red-small"]);

    let red_big = store
        .cards_by_tags(&scope, &TagFilter::required(["red", "big"]))
        .unwrap();
    assert_eq!(names(&red_big), vec!["red-big"]);
}

#[test]
fn any_of_keeps_cards_carrying_at_least_one() {
    let (store, scope) = seeded_store();
    let hit = store
        .cards_by_tags(&scope, &TagFilter::any_of(["small", "blue"]))
        .unwrap();
    assert_eq!(names(&hit), vec!["red-small", "blue-big"]);
}

#[test]
fn required_plus_any_of_runs_both_phases() {
    let (store, scope) = seeded_store();
    let filter = TagFilter {
        required: vec!["red".to_string()],
        any_of: vec!["big".to_string(), "blue".to_string()],
        exclude: vec![],
    };
    let hit = store.cards_by_tags(&scope, &filter).unwrap();
    assert_eq!(names(&hit), vec!["red-big"]);
}

#[test]
fn exclude_removes_cards_carrying_the_tag() {
    let (store, scope) = seeded_store();
    let filter = TagFilter {
        required: vec![],
        any_of: vec![],
        exclude: vec!["red".to_string()],
    };
    let hit = store.cards_by_tags(&scope, &filter).unwrap();
    assert_eq!(names(&hit), vec!["blue-big", "plain"]);
}

#[test]
fn unknown_tag_yields_empty_not_error() {
    let (store, scope) = seeded_store();
    let hit = store
        .cards_by_tags(&scope, &TagFilter::required(["no-such-tag"]))
        .unwrap();
    assert!(hit.is_empty());
}

#[test]
fn deleted_cards_never_match_filters() {
    let (store, scope) = seeded_store();
    let red = store
        .cards_by_tags(&scope, &TagFilter::required(["red"]))
        .unwrap();
    store.delete_card(&scope, &red[0].id).unwrap();

    let red_after = store
        .cards_by_tags(&scope, &TagFilter::required(["red"]))
        .unwrap();
    assert_eq!(names(&red_after), vec!["red-small"]);

    let all = store.cards_by_tags(&scope, &TagFilter::all()).unwrap();
    assert_eq!(all.len(), 3);
}

// ── Scope isolation ───────────────────────────────────────────────────────

#[test]
fn owners_in_one_workspace_do_not_see_each_other_cards() {
    let store = store();
    let alice = scope("w", "alice");
    let bob = scope("w", "bob");
    store.save_card(&card(&alice, "a-card", &["shared"])).unwrap();
    store.save_card(&card(&bob, "b-card", &["shared"])).unwrap();

    let a = store.cards_by_tags(&alice, &TagFilter::all()).unwrap();
    assert_eq!(names(&a), vec!["a-card"]);
    let b = store
        .cards_by_tags(&bob, &TagFilter::required(["shared"]))
        .unwrap();
    assert_eq!(names(&b), vec!["b-card"]);
}

#[test]
fn workspaces_do_not_see_each_other_at_all() {
    let store = store();
    let left = scope("left", "u");
    let right = scope("right", "u");
    let c = card(&left, "mine", &["secret"]);
    store.save_card(&c).unwrap();

    assert!(store
        .cards_by_tags(&right, &TagFilter::all())
        .unwrap()
        .is_empty());
    assert!(store.all_tags(&right).unwrap().is_empty());
    assert!(matches!(
        store.card_by_id(&right, &c.id),
        Err(CardboxError::CardNotFound { .. })
    ));
}

// ── Tag listings and counts ───────────────────────────────────────────────

#[test]
fn all_tags_is_sorted_by_name_with_live_counts() {
    let store = store();
    let scope = scope("w", "u");
    store.save_card(&card(&scope, "one", &["zebra", "apple"])).unwrap();
    store.save_card(&card(&scope, "two", &["apple"])).unwrap();

    let tags = store.all_tags(&scope).unwrap();
    let listed: Vec<(&str, u64)> = tags
        .iter()
        .map(|t| (t.name.as_str(), t.card_count))
        .collect();
    assert_eq!(listed, vec![("apple", 2), ("zebra", 1)]);
}

#[test]
fn deleting_a_card_decrements_its_tag_counts() {
    let store = store();
    let scope = scope("w", "u");
    let keep = card(&scope, "keep", &["apple"]);
    let drop = card(&scope, "drop", &["apple", "zebra"]);
    store.save_card(&keep).unwrap();
    store.save_card(&drop).unwrap();

    store.delete_card(&scope, &drop.id).unwrap();

    let tags = store.all_tags(&scope).unwrap();
    let listed: Vec<(&str, u64)> = tags
        .iter()
        .map(|t| (t.name.as_str(), t.card_count))
        .collect();
    assert_eq!(listed, vec![("apple", 1), ("zebra", 0)]);
}

#[test]
fn reassigning_tags_moves_counts_atomically() {
    let store = store();
    let scope = scope("w", "u");
    let mut c = card(&scope, "moving", &["a", "b"]);
    store.save_card(&c).unwrap();

    c.set_tags(vec!["b".to_string(), "c".to_string()]);
    store.save_card(&c).unwrap();

    let listed: Vec<(String, u64)> = store
        .all_tags(&scope)
        .unwrap()
        .into_iter()
        .map(|t| (t.name, t.card_count))
        .collect();
    assert_eq!(
        listed,
        vec![
            ("a".to_string(), 0),
            ("b".to_string(), 1),
            ("c".to_string(), 1)
        ]
    );

    let by_a = store.cards_by_tags(&scope, &TagFilter::required(["a"])).unwrap();
    assert!(by_a.is_empty());
    let by_c = store.cards_by_tags(&scope, &TagFilter::required(["c"])).unwrap();
    assert_eq!(names(&by_c), vec!["moving"]);
}

#[test]
fn deleted_tag_disappears_from_listing_but_cards_keep_it() {
    let store = store();
    let scope = scope("w", "u");
    let c = card(&scope, "carrier", &["doomed", "kept"]);
    store.save_card(&c).unwrap();

    store.delete_tag(&scope, "doomed").unwrap();

    let listed: Vec<String> = store
        .all_tags(&scope)
        .unwrap()
        .into_iter()
        .map(|t| t.name)
        .collect();
    assert_eq!(listed, vec!["kept"]);

    // Filters resolve names structurally, so the card still matches.
    let hit = store
        .cards_by_tags(&scope, &TagFilter::required(["doomed"]))
        .unwrap();
    assert_eq!(names(&hit), vec!["carrier"]);
}

#[test]
fn deleting_an_unknown_tag_is_not_found() {
    let store = store();
    let err = store.delete_tag(&scope("w", "u"), "ghost").unwrap_err();
    assert!(matches!(err, CardboxError::TagNotFound { .. }));
}

// ── Restart behavior ──────────────────────────────────────────────────────

#[test]
fn index_is_rebuilt_from_storage_on_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("cards.db");
    let config = StorageConfig::default();
    let scope = scope("w", "u");

    let (red_id, deleted_id) = {
        let store = LocalStore::open(&db_path, &config, tracker()).unwrap();
        let red = card(&scope, "red", &["red"]);
        let blue = card(&scope, "blue", &["blue"]);
        let doomed = card(&scope, "doomed", &["red"]);
        store.save_card(&red).unwrap();
        store.save_card(&blue).unwrap();
        store.save_card(&doomed).unwrap();
        store.delete_card(&scope, &doomed.id).unwrap();
        (red.id.clone(), doomed.id.clone())
    };

    let store = LocalStore::open(&db_path, &config, tracker()).unwrap();
    let red = store
        .cards_by_tags(&scope, &TagFilter::required(["red"]))
        .unwrap();
    assert_eq!(red.len(), 1);
    assert_eq!(red[0].id, red_id);
    assert!(matches!(
        store.card_by_id(&scope, &deleted_id),
        Err(CardboxError::CardNotFound { .. })
    ));

    dir.close().unwrap();
}

#[test]
fn updates_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("cards.db");
    let config = StorageConfig::default();
    let scope = scope("w", "u");

    let id = {
        let store = LocalStore::open(&db_path, &config, tracker()).unwrap();
        let mut c = card(&scope, "draft", &["old"]);
        store.save_card(&c).unwrap();
        c.name = "final".to_string();
        c.set_tags(vec!["new".to_string()]);
        store.save_card(&c).unwrap();
        c.id.clone()
    };

    let store = LocalStore::open(&db_path, &config, tracker()).unwrap();
    let loaded = store.card_by_id(&scope, &id).unwrap();
    assert_eq!(loaded.name, "final");
    assert_eq!(loaded.tags, vec!["new"]);
    assert!(store
        .cards_by_tags(&scope, &TagFilter::required(["old"]))
        .unwrap()
        .is_empty());

    dir.close().unwrap();
}

#[test]
fn local_store_does_not_sync() {
    assert!(!store().can_sync());
}
