use disambig_core::{PageTitle, Tags};
use disambig_index::{DisambigConfig, NearMatch, RelatedHeads, REQUEST_KEY};
use disambig_test_utils::{config_with_priorities, setup_mercury, tags, TestIndex};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

#[test]
fn request_key_is_never_a_page_id() {
    let fixture = setup_mercury();
    assert_eq!(REQUEST_KEY, 0);
    assert!(fixture
        .index
        .store(&PageTitle::new(0, "Mercury（moon）"), tags(&["moon"]), "")
        .unwrap()
        .is_none());
    assert_eq!(fixture.backend.record_count(), 2);
}

#[test]
fn unique_match_returns_existing_name() {
    let fixture = setup_mercury();
    assert_eq!(fixture.resolve("Mercury", &["planet"]), "Mercury（planet）");
    assert_eq!(fixture.resolve("Mercury", &["element"]), "Mercury（element）");
}

#[test]
fn new_declaration_gets_its_own_tail() {
    let fixture = setup_mercury();
    assert_eq!(fixture.resolve("Mercury", &["moon"]), "Mercury（moon）");
    // tags inferred from the written tail
    assert_eq!(fixture.resolve("Mercury（moon）", &[]), "Mercury（moon）");
}

#[test]
fn untagged_request_prefers_first_matching_page() {
    let fixture = setup_mercury();
    assert_eq!(fixture.resolve("Mercury", &[]), "Mercury（planet）");
}

#[test]
fn empty_collision_set_without_page_needs_no_tail() {
    let fixture = setup_mercury();
    assert_eq!(fixture.resolve("Venus", &["planet"]), "Venus");
}

#[test]
fn empty_collision_set_with_page_at_head_takes_first_tag() {
    let fixture = setup_mercury();
    fixture.backend.add_page(PageTitle::new(0, "Venus").with_id(5));
    assert_eq!(fixture.resolve("Venus", &["planet", "rocky"]), "Venus（planet）");
    assert_eq!(fixture.resolve("Venus", &[]), "Venus");
}

#[test]
fn resolve_is_idempotent() {
    let fixture = setup_mercury();
    let requests: [&[&str]; 3] = [&["moon"], &["planet"], &[]];
    for request in requests {
        let first = fixture.resolve("Mercury", request);
        let second = fixture.resolve("Mercury", request);
        assert_eq!(first, second);
    }
}

#[test]
fn store_invalidates_cached_collision_set() {
    let fixture = setup_mercury();
    assert_eq!(fixture.resolve("Mercury", &["satellite"]), "Mercury（satellite）");

    fixture.add(3, 0, "Mercury（moon）", &["moon", "satellite"], "");
    assert_eq!(fixture.resolve("Mercury", &["satellite"]), "Mercury（moon）");
}

#[test]
fn moving_a_page_updates_old_and_new_heads() {
    let fixture = setup_mercury();
    assert_eq!(fixture.index.collision_set(0, "Mercury", true).unwrap().len(), 2);
    assert!(fixture.index.collision_set(0, "Quicksilver", true).unwrap().is_empty());

    fixture.add(2, 0, "Quicksilver", &["element"], "");
    assert_eq!(
        fixture
            .index
            .collision_set(0, "Mercury", true)
            .unwrap()
            .keys()
            .copied()
            .collect::<Vec<_>>(),
        vec![1]
    );
    assert_eq!(fixture.index.collision_set(0, "Quicksilver", true).unwrap().len(), 1);
}

#[test]
fn near_match_outcomes() {
    let fixture = setup_mercury();
    fixture.add(5, 0, "Venus", &[], "");

    assert_eq!(
        fixture.index.near_match("Mercury（anything）").unwrap(),
        NearMatch::Ambiguous {
            head: "Mercury".to_string()
        }
    );
    assert_eq!(
        fixture.index.near_match("venus").unwrap(),
        NearMatch::Unique(PageTitle::new(0, "Venus").with_id(5))
    );
    assert_eq!(fixture.index.near_match("Pluto").unwrap(), NearMatch::NoMatch);
}

#[test]
fn conflict_report_proposes_minimal_names() {
    let fixture = setup_mercury();
    let report = fixture.index.conflict_report(0, "Mercury").unwrap().unwrap();

    assert_eq!(report.head, "mercury");
    assert_eq!(report.entries.len(), 2);

    let planet = &report.entries[0];
    assert_eq!(planet.current, "Mercury（planet）");
    assert_eq!(planet.proposed, "Mercury");
    assert!(planet.needs_move);
    assert!(!planet.unsolved);

    let element = &report.entries[1];
    assert_eq!(element.current, "Mercury（element）");
    assert_eq!(element.proposed, "Mercury（element）");
    assert!(!element.needs_move);
    assert!(!report.is_clean());
}

#[test]
fn conflict_report_drops_redirects_into_the_set() {
    let fixture = setup_mercury();
    fixture.add_redirect(4, "Mercury（god）", Some(1));
    fixture.add_redirect(6, "Mercury（deity）", Some(99));
    fixture.add_redirect(7, "Mercury（myth）", None);

    let report = fixture.index.conflict_report(0, "Mercury").unwrap().unwrap();
    let ids: Vec<u64> = report.entries.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![1, 2, 6]);

    let redirect = &report.entries[2];
    assert!(redirect.is_redirect);
    assert_eq!(redirect.redirect_target, Some(99));
}

#[test]
fn conflict_report_marks_ties_unsolved() {
    let fixture = TestIndex::new(&DisambigConfig::default());
    fixture.add(1, 0, "Mercury（x）", &["x"], "");
    fixture.add(2, 0, "Mercury（x）", &["x"], "");

    let report = fixture.index.conflict_report(0, "Mercury").unwrap().unwrap();
    assert_eq!(report.unsolved().count(), 2);
    assert_eq!(report.moves().count(), 0);
}

#[test]
fn conflict_report_needs_a_collision() {
    let fixture = setup_mercury();
    fixture.add(5, 0, "Venus", &[], "");
    assert!(fixture.index.conflict_report(0, "Venus").unwrap().is_none());
    assert!(fixture.index.conflict_report(0, "Pluto").unwrap().is_none());
}

#[test]
fn conflict_report_skips_move_between_equal_priorities() {
    let fixture = TestIndex::new(&config_with_priorities(&[("", 10)]));
    fixture.add(1, 0, "Mercury（a）", &["a", "b"], "");
    fixture.add(2, 0, "Mercury（c）", &["c"], "");

    // both tags rank 10, so nobody is exempted and names already match
    let report = fixture.index.conflict_report(0, "Mercury").unwrap().unwrap();
    assert!(report.is_clean());
}

#[test]
fn disambiguation_list_excludes_current_page() {
    let fixture = setup_mercury();
    let rows = fixture
        .index
        .disambiguation_list(0, "Mercury", Some(1), &RelatedHeads::new())
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].title, "Mercury（element）");
    assert_eq!(rows[0].label.as_deref(), Some("element"));
}

#[test]
fn disambiguation_list_uses_state_as_label() {
    let fixture = setup_mercury();
    let rows = fixture
        .index
        .disambiguation_list(0, "Mercury", None, &RelatedHeads::new())
        .unwrap();
    assert_eq!(rows[0].label.as_deref(), Some("innermost planet"));
}

#[test]
fn disambiguation_list_merges_related_heads() {
    let fixture = setup_mercury();
    fixture.add(8, 0, "Quicksilver（fluid）", &["fluid"], "");
    fixture.backend.add_page(PageTitle::new(0, "Hg").with_id(9));

    let mut related = RelatedHeads::new();
    related.insert("Quicksilver".to_string(), String::new());
    related.insert("Hg".to_string(), "chemical symbol".to_string());
    related.insert("Nowhere".to_string(), "missing page".to_string());

    let rows = fixture
        .index
        .disambiguation_list(0, "Mercury", None, &related)
        .unwrap();
    let titles: Vec<&str> = rows.iter().map(|row| row.title.as_str()).collect();
    assert_eq!(
        titles,
        vec!["Mercury（planet）", "Mercury（element）", "Quicksilver（fluid）", "Hg"]
    );
    assert_eq!(rows[3].label.as_deref(), Some("chemical symbol"));
}

#[test]
fn disambiguation_list_drops_redirects_and_listing_pages() {
    let fixture = setup_mercury();
    fixture.add_redirect(4, "Mercury（god）", Some(1));
    fixture.add(5, 0, "Mercury（disambiguation）", &["disambiguation"], "");
    fixture.backend.mark_disambiguation(5);

    let rows = fixture
        .index
        .disambiguation_list(0, "Mercury", None, &RelatedHeads::new())
        .unwrap();
    assert_eq!(rows.iter().map(|row| row.id).collect::<Vec<_>>(), vec![1, 2]);
}

#[test]
fn redirect_listing_names_other_pages_sharing_the_redirect_name() {
    let fixture = setup_mercury();
    fixture.add(20, 0, "Hg（band）", &["band"], "rock group");
    fixture.add(21, 0, "Hg（album）", &["album"], "");
    fixture.add_redirect(22, "Hg", Some(2));

    let listings = fixture.index.redirect_listings(2).unwrap();
    assert_eq!(listings.len(), 1);
    assert_eq!(listings[0].id, 22);
    assert_eq!(listings[0].title, "Hg");
    let titles: Vec<&str> = listings[0]
        .entries
        .iter()
        .map(|row| row.title.as_str())
        .collect();
    assert_eq!(titles, vec!["Hg（band）", "Hg（album）"]);
    assert_eq!(listings[0].entries[0].label.as_deref(), Some("rock group"));
}

#[test]
fn redirect_listing_skips_names_leading_back_to_target() {
    let fixture = setup_mercury();
    fixture.add_redirect(22, "Mercury", Some(1));
    fixture.add_redirect(23, "Quicksilver", Some(1));

    // "Mercury" also names page 1 itself; nothing else is called "Quicksilver"
    assert!(fixture.index.redirect_listings(1).unwrap().is_empty());
}

#[test]
fn redirect_listing_of_missing_target_is_empty() {
    let fixture = setup_mercury();
    fixture.add(20, 0, "Hg（band）", &["band"], "");
    fixture.add_redirect(22, "Hg", Some(99));
    assert!(fixture.index.redirect_listings(99).unwrap().is_empty());
}

#[test]
fn conflicts_list_tagged_collisions() {
    let fixture = setup_mercury();
    fixture.add(5, 0, "Venus", &[], "");
    fixture.add(6, 0, "venus", &[], "");

    let heads = fixture.index.conflicts().unwrap();
    assert_eq!(heads.len(), 1);
    assert_eq!(heads[0].head, "mercury");
    assert_eq!(heads[0].count, 2);

    let groups = fixture.index.same_name_groups().unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].ids, vec![5, 6]);
}

#[test]
fn delete_shrinks_collision() {
    let fixture = setup_mercury();
    fixture.index.delete(2).unwrap();
    assert_eq!(fixture.resolve("Mercury", &[]), "Mercury（planet）");
    assert!(fixture.index.conflict_report(0, "Mercury").unwrap().is_none());
}

#[test]
fn extension_namespace_keeps_extension() {
    let fixture = setup_mercury();
    fixture.add(10, 6, "Mercury（planet）.png", &["planet"], "");
    fixture.add(11, 6, "Mercury（element）.png", &["element"], "");

    let name = fixture
        .index
        .resolve(&PageTitle::new(6, "Mercury.png"), &Tags::parse("moon", '|'))
        .unwrap();
    assert_eq!(name, "File:Mercury（moon）.png");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_resolve_is_idempotent(request in proptest::collection::vec("[a-z]{1,6}", 0..3)) {
        let fixture = setup_mercury();
        let request: Vec<&str> = request.iter().map(String::as_str).collect();
        prop_assert_eq!(
            fixture.resolve("Mercury", &request),
            fixture.resolve("Mercury", &request)
        );
    }
}
