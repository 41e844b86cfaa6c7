//! Property tests pinning the store to a naive reference: filter results
//! must equal a predicate scan over the saved cards, and tag counts must
//! equal the number of live cards carrying each tag.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use proptest::prelude::*;

use cardbox_adaptive::PerfTracker;
use cardbox_core::config::{AdaptiveConfig, StorageConfig};
use cardbox_core::model::Card;
use cardbox_core::scope::{ScopeKey, UserId, WorkspaceId};
use cardbox_core::traits::{CardStore, TagFilter};
use cardbox_storage::LocalStore;

const TAG_POOL: usize = 5;

fn store() -> LocalStore {
    let tracker = Arc::new(PerfTracker::new(AdaptiveConfig::default()));
    LocalStore::open_in_memory(&StorageConfig::default(), tracker).unwrap()
}

fn scope() -> ScopeKey {
    ScopeKey::new(WorkspaceId::new("w"), UserId::new("u")).unwrap()
}

fn tag_name(i: usize) -> String {
    format!("t{i}")
}

fn to_names(indices: &BTreeSet<usize>) -> Vec<String> {
    indices.iter().map(|&i| tag_name(i)).collect()
}

fn arb_tag_set() -> impl Strategy<Value = BTreeSet<usize>> {
    prop::collection::btree_set(0..TAG_POOL, 0..4)
}

fn arb_cards() -> impl Strategy<Value = Vec<BTreeSet<usize>>> {
    prop::collection::vec(arb_tag_set(), 0..12)
}

fn arb_filter() -> impl Strategy<Value = (BTreeSet<usize>, BTreeSet<usize>, BTreeSet<usize>)> {
    (arb_tag_set(), arb_tag_set(), arb_tag_set())
}

/// The documented filter semantics, written the slow obvious way.
fn naive_matches(
    tags: &BTreeSet<usize>,
    (required, any_of, exclude): &(BTreeSet<usize>, BTreeSet<usize>, BTreeSet<usize>),
) -> bool {
    required.iter().all(|t| tags.contains(t))
        && (any_of.is_empty() || any_of.iter().any(|t| tags.contains(t)))
        && exclude.iter().all(|t| !tags.contains(t))
}

fn save_all(store: &LocalStore, card_tags: &[BTreeSet<usize>]) -> Vec<Card> {
    let scope = scope();
    card_tags
        .iter()
        .enumerate()
        .map(|(i, tags)| {
            let card = Card::new(scope.clone(), format!("c{i}"), "", to_names(tags));
            store.save_card(&card).unwrap();
            card
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_filter_agrees_with_a_naive_scan(
        card_tags in arb_cards(),
        filter in arb_filter(),
    ) {
        let store = store();
        let cards = save_all(&store, &card_tags);

        let query = TagFilter {
            required: to_names(&filter.0),
            any_of: to_names(&filter.1),
            exclude: to_names(&filter.2),
        };
        let got: HashSet<String> = store
            .cards_by_tags(&scope(), &query)
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();

        let want: HashSet<String> = cards
            .iter()
            .zip(&card_tags)
            .filter(|(_, tags)| naive_matches(tags, &filter))
            .map(|(c, _)| c.id.clone())
            .collect();

        prop_assert_eq!(got, want);
    }

    #[test]
    fn prop_empty_filter_lists_every_card(card_tags in arb_cards()) {
        let store = store();
        let cards = save_all(&store, &card_tags);

        let got: HashSet<String> = store
            .cards_by_tags(&scope(), &TagFilter::all())
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        let want: HashSet<String> = cards.iter().map(|c| c.id.clone()).collect();
        prop_assert_eq!(got, want);
    }

    #[test]
    fn prop_tag_counts_equal_live_references(
        card_tags in arb_cards(),
        delete_first in 0usize..4,
    ) {
        let store = store();
        let cards = save_all(&store, &card_tags);

        let deleted = delete_first.min(cards.len());
        for card in &cards[..deleted] {
            store.delete_card(&scope(), &card.id).unwrap();
        }

        let survivors = &card_tags[deleted..];
        let listed = store.all_tags(&scope()).unwrap();
        for tag in &listed {
            let carrying = survivors
                .iter()
                .filter(|tags| tags.iter().any(|&i| tag_name(i) == tag.name))
                .count() as u64;
            prop_assert_eq!(
                tag.card_count,
                carrying,
                "count for {} diverged",
                tag.name
            );
        }

        // Every tag referenced by a survivor is listed.
        let listed_names: HashSet<&str> = listed.iter().map(|t| t.name.as_str()).collect();
        for tags in survivors {
            for &i in tags {
                prop_assert!(listed_names.contains(tag_name(i).as_str()));
            }
        }
    }
}
