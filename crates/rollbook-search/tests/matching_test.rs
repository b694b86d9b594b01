//! Entity matcher behavior over a realistic catalog.

use proptest::prelude::*;
use rollbook_core::{Catalog, MatchingConfig};
use rollbook_search::EntityMatchers;
use rollbook_taxonomy::TaxonomyIndex;

const CATALOG: &str = r#"{
  "positions": [
    {"id": "guard", "name": "Guard", "slug": "guard", "perspective": "bottom"},
    {"id": "closed-guard", "name": "Closed Guard", "slug": "closed-guard", "parentId": "guard", "perspective": "bottom"},
    {"id": "open-guard", "name": "Open Guard", "slug": "open-guard", "parentId": "guard", "perspective": "bottom"},
    {"id": "half-guard", "name": "Half Guard", "slug": "half-guard", "parentId": "guard", "perspective": "bottom"},
    {"id": "mount", "name": "Mount", "slug": "mount", "perspective": "top"},
    {"id": "side-control", "name": "Side Control", "slug": "side-control", "perspective": "top"}
  ],
  "techniques": [
    {"id": "sc-escape", "name": "Escape", "category": "escape", "positionFromId": "side-control"},
    {"id": "cg-guard-escape", "name": "Guard Escape", "category": "escape", "positionFromId": "closed-guard"},
    {"id": "armbar-cg", "name": "Armbar", "category": "submission", "positionFromId": "closed-guard",
     "submissionType": "joint_lock", "aliases": ["Juji Gatame"]},
    {"id": "armbar-mount", "name": "Armbar", "category": "submission", "positionFromId": "mount",
     "submissionType": "joint_lock"},
    {"id": "mount-kimura", "name": "Kimura", "category": "submission", "positionFromId": "mount"}
  ]
}"#;

fn index() -> TaxonomyIndex {
    TaxonomyIndex::build(Catalog::from_json(CATALOG).unwrap())
}

fn matchers() -> EntityMatchers {
    EntityMatchers::build(&index(), &MatchingConfig::default())
}

#[test]
fn test_empty_and_unrelated_queries_are_rejected() {
    let m = matchers();
    assert!(m.match_position("").is_none());
    assert!(m.match_position("zzqxnomatch").is_none());
    assert!(m.match_technique("zzqxnomatch", None).is_none());
}

#[test]
fn test_fragments_are_not_matches() {
    let m = matchers();
    assert!(m.match_position("o").is_none());
    assert!(m.match_position("gu").is_none());
    assert!(m.match_technique("a", None).is_none());
    assert!(m.match_technique("a", Some("mount")).is_none());
    assert!(m.search_positions("u", 10).is_empty());
}

#[test]
fn test_typos_resolve_to_closed_guard() {
    let m = matchers();
    let hit = m.match_position("clsed gaurd").unwrap();
    assert_eq!(hit.entity_name, "Closed Guard");
    assert!(hit.score > 0.5, "score {}", hit.score);
}

#[test]
fn test_ancestor_context_in_query() {
    let m = matchers();
    let hit = m.match_position("bottom closed guard").unwrap();
    assert_eq!(hit.entity_id, "closed-guard");
}

#[test]
fn test_exact_name_scores_one() {
    let m = matchers();
    let hit = m.match_position("Mount").unwrap();
    assert_eq!(hit.entity_id, "mount");
    assert_eq!(hit.score, 1.0);
}

#[test]
fn test_alias_resolves_technique() {
    let m = matchers();
    let hit = m.match_technique("juji gatame", None).unwrap();
    assert_eq!(hit.entity_id, "armbar-cg");
    assert!(hit.score > 0.5);
}

#[test]
fn test_context_beats_better_global_candidate() {
    let m = matchers();

    let global = m.match_technique("escape", None).unwrap();
    assert_eq!(global.entity_id, "sc-escape");

    let in_context = m.match_technique("escape", Some("closed-guard")).unwrap();
    assert_eq!(in_context.entity_id, "cg-guard-escape");
    assert!(in_context.score < global.score);
}

#[test]
fn test_context_disambiguates_identical_names() {
    let m = matchers();
    let hit = m.match_technique("armbar", Some("mount")).unwrap();
    assert_eq!(hit.entity_id, "armbar-mount");
    let hit = m.match_technique("armbar", Some("closed-guard")).unwrap();
    assert_eq!(hit.entity_id, "armbar-cg");
}

#[test]
fn test_context_without_qualifying_technique_falls_back() {
    let m = matchers();
    let hit = m.match_technique("escape", Some("mount")).unwrap();
    assert_eq!(hit.entity_id, "sc-escape");
}

#[test]
fn test_search_limits_and_orders() {
    let m = matchers();
    let hits = m.search_positions("guard", 3);
    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0].entity_id, "guard");
    for pair in hits.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
    assert!(m.search_techniques("armbar", 0).is_empty());
}

#[test]
fn test_threshold_is_configurable() {
    let strict = MatchingConfig {
        threshold: 0.1,
        ..MatchingConfig::default()
    };
    let m = EntityMatchers::build(&index(), &strict);
    assert!(m.match_position("clsed gaurd").is_none());
    assert!(m.match_position("closed guard").is_some());
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, failure_persistence: None, ..ProptestConfig::default() })]

    #[test]
    fn scores_stay_within_threshold_band(query in "[a-z ]{0,16}") {
        let m = matchers();
        let floor = 1.0 - m.threshold();
        if let Some(hit) = m.match_position(&query) {
            prop_assert!(hit.score >= floor - 1e-6 && hit.score <= 1.0);
        }
        for hit in m.search_techniques(&query, 10) {
            prop_assert!(hit.score >= floor - 1e-6 && hit.score <= 1.0);
        }
    }
}
