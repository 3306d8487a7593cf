//! Property-based tests for ordering and cascade scoping.
//!
//! Uses proptest to verify invariants across random inputs:
//! - Display order follows persisted ranks, unranked sites last and stable
//! - Filter board-token matching never panics and matches exactly
//! - Trailing `:` pieces of a token are not counted as parts

// Property tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use proptest::prelude::*;
use siterepo::repository::cascade::{filters_referencing, references_site};
use siterepo::{Filter, Ordering, Site, SiteId, Sites, UserSettings, VariantId, VariantRegistry};
use std::sync::Arc;

fn site(id: u32) -> Arc<Site> {
    let kind = VariantRegistry::new()
        .instantiate(VariantId::new(id % 7))
        .unwrap();
    Arc::new(Site::initialize(SiteId::new(id), kind, UserSettings::new()))
}

/// Unique site IDs in random insertion order, each with an optional rank.
fn ranked_sites() -> impl Strategy<Value = Vec<(u32, Option<u32>)>> {
    prop::collection::hash_set(1u32..500, 0..30)
        .prop_flat_map(|ids| {
            let ids: Vec<u32> = ids.into_iter().collect();
            let len = ids.len();
            (
                Just(ids).prop_shuffle(),
                prop::collection::vec(prop::option::of(0u32..20), len),
            )
        })
        .prop_map(|(ids, ranks)| ids.into_iter().zip(ranks).collect())
}

proptest! {
    /// Property: ordered output is a permutation sorted by rank, with
    /// unranked sites after ranked ones in insertion order.
    #[test]
    fn prop_all_in_order_is_deterministic(entries in ranked_sites()) {
        let sites = Sites::new(4);
        for (id, _) in &entries {
            sites.add(site(*id));
        }
        let ordering: Ordering = entries
            .iter()
            .filter_map(|(id, rank)| rank.map(|r| (SiteId::new(*id), r)))
            .collect();

        let ordered: Vec<u32> = sites
            .all_in_order(&ordering)
            .iter()
            .map(|s| s.id().get())
            .collect();
        prop_assert_eq!(ordered.len(), entries.len());

        let mut expected: Vec<(u32, Option<u32>)> = entries.clone();
        expected.sort_by_key(|(_, rank)| rank.map_or(u64::MAX, u64::from));
        let expected: Vec<u32> = expected.into_iter().map(|(id, _)| id).collect();
        prop_assert_eq!(&ordered, &expected);

        let again: Vec<u32> = sites
            .all_in_order(&ordering)
            .iter()
            .map(|s| s.id().get())
            .collect();
        prop_assert_eq!(ordered, again);
    }

    /// Property: a board list built from owner IDs references exactly the
    /// sites it names.
    #[test]
    fn prop_references_exactly_named_sites(
        owners in prop::collection::vec(0u32..50, 1..6),
        target in 0u32..50,
    ) {
        let boards = owners
            .iter()
            .map(|owner| format!("{owner}:b"))
            .collect::<Vec<_>>()
            .join(",");
        prop_assert_eq!(
            references_site(&boards, SiteId::new(target)),
            owners.contains(&target)
        );
    }

    /// Property: trailing colons never change the part count of a token.
    #[test]
    fn prop_trailing_colons_are_ignored(
        owner in 0u32..50,
        code in "[a-z]{1,4}",
        colons in 1usize..4,
        target in 0u32..50,
    ) {
        let trailing = ":".repeat(colons);
        prop_assert_eq!(
            references_site(&format!("{owner}:{code}{trailing}"), SiteId::new(target)),
            owner == target
        );
        let bare = format!("{owner}{trailing}");
        prop_assert!(!references_site(&bare, SiteId::new(target)));
    }

    /// Property: arbitrary board text never panics, and unscoped filters are
    /// never selected.
    #[test]
    fn prop_arbitrary_board_text_is_safe(boards in ".{0,64}", target in 0u32..10) {
        let _ = references_site(&boards, SiteId::new(target));

        let filters = vec![
            Filter { id: 1, ..Filter::scoped("p", boards.clone()) },
            Filter { id: 2, all_boards: true, ..Filter::scoped("p", boards.clone()) },
            Filter { id: 3, ..Filter::scoped("p", "") },
        ];
        let selected = filters_referencing(&filters, SiteId::new(target));
        prop_assert!(!selected.contains(&2));
        prop_assert!(!selected.contains(&3));
    }
}
