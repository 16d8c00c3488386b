use std::collections::HashSet;
use std::sync::Arc;

use hri::search::{HybridSearch, SearchQuery};
use hri::storage::{UnavailableIndex, VectorIndex};
use hri::test_utils::fixtures::{
    MemoryStore, SAMPLE_EXTRACTION_JSON, TempRoot, alice, bob, carol, sample_candidates,
};
use hri::test_utils::{TestCase, run_table_tests};
use hri::{HriError, Result};

fn ids(results: &[hri::search::SearchResult]) -> Vec<String> {
    results.iter().map(|r| r.candidate.id.clone()).collect()
}

#[test]
fn test_skill_only_results_all_match_the_skill() {
    let store = MemoryStore::with_candidates(&sample_candidates());
    let results = store
        .search
        .search(&SearchQuery::new().with_skills(["python"]))
        .unwrap();
    assert_eq!(ids(&results), vec!["c-alice", "c-bob"]);
    for result in &results {
        assert!(
            result
                .explanation
                .matched_skills
                .iter()
                .all(|hit| hit.score >= 0.8)
        );
    }
}

#[test]
fn test_match_all_is_subset_of_match_any() {
    let store = MemoryStore::with_candidates(&sample_candidates());
    let skills = ["Python", "Django"];
    let any: HashSet<String> = ids(&store
        .search
        .search(&SearchQuery::new().with_skills(skills))
        .unwrap())
    .into_iter()
    .collect();
    let all: HashSet<String> = ids(&store
        .search
        .search(&SearchQuery::new().with_skills(skills).match_all_skills(true))
        .unwrap())
    .into_iter()
    .collect();
    assert!(all.is_subset(&any));
    assert_eq!(all, HashSet::from(["c-bob".to_string()]));
}

#[test]
fn test_ordering_is_deterministic() {
    let store = MemoryStore::with_candidates(&sample_candidates());
    let query = SearchQuery::new()
        .with_text("software engineering")
        .with_skills(["python", "figma"]);
    let first = ids(&store.search.search(&query).unwrap());
    for _ in 0..5 {
        assert_eq!(ids(&store.search.search(&query).unwrap()), first);
    }
}

#[test]
fn test_upsert_is_idempotent_across_stores() {
    let store = MemoryStore::new();
    let candidate = alice();
    for _ in 0..3 {
        store.insert(&candidate);
    }
    assert_eq!(store.db.count_candidates().unwrap(), 1);
    assert_eq!(store.vectors.len().unwrap(), 1);
    assert_eq!(store.db.get_by_id("c-alice").unwrap(), Some(candidate));
}

#[test]
fn test_delete_is_complete() {
    let store = MemoryStore::with_candidates(&sample_candidates());
    assert!(store.ingestor().delete("c-bob").unwrap().existed);
    assert_eq!(store.db.references("c-bob").unwrap(), 0);
    assert!(!store.vectors.contains("c-bob").unwrap());
    let results = store
        .search
        .search(&SearchQuery::new().with_skills(["django"]))
        .unwrap();
    assert!(results.is_empty());
}

#[test]
fn test_degrades_without_vector_store() {
    let store = MemoryStore::with_candidates(&sample_candidates());
    let vectors: Arc<dyn VectorIndex> = Arc::new(UnavailableIndex::new("offline"));
    let search = HybridSearch::new(Arc::clone(&store.db), vectors);
    let results = search
        .search(
            &SearchQuery::new()
                .with_text("cloud infrastructure")
                .with_skills(["kubernetes"]),
        )
        .unwrap();
    assert_eq!(ids(&results), vec!["c-alice"]);
    assert!(results[0].degraded);
    assert!(results[0].scores.semantic.abs() < f32::EPSILON);
}

#[test]
fn test_alice_example() {
    let store = MemoryStore::with_candidates(&[alice()]);
    let tools = store.tools();
    let found = tools
        .semantic_search_experience("cloud infrastructure")
        .unwrap();
    assert_eq!(found[0].candidate_id, "c-alice");
    assert!(found[0].score > 0.0);
    assert!(
        tools
            .find_skill_combinations(&["Java".to_string()], false)
            .unwrap()
            .is_empty()
    );
}

#[test]
fn test_education_and_company_filters() {
    let store = MemoryStore::with_candidates(&[alice(), bob(), carol()]);
    let cases = vec![
        TestCase {
            name: "institution",
            input: SearchQuery::new().with_education(["Stanford University"]),
            expected: vec!["c-bob".to_string()],
        },
        TestCase {
            name: "company suffix ignored",
            input: SearchQuery::new().with_companies(["Acme"]),
            expected: vec!["c-alice".to_string()],
        },
        TestCase {
            name: "exact company requires the company",
            input: SearchQuery::new()
                .with_skills(["python"])
                .with_companies(["Globex Corporation"])
                .exact_companies(true),
            expected: vec!["c-bob".to_string()],
        },
        TestCase {
            name: "role via responsibilities",
            input: SearchQuery::new().with_roles(["mobile app redesign"]),
            expected: vec!["c-carol".to_string()],
        },
    ];
    run_table_tests(cases, |query| ids(&store.search.search(&query).unwrap())).unwrap();
}

#[test]
fn test_empty_query_is_rejected() {
    let store = MemoryStore::with_candidates(&sample_candidates());
    let result: Result<_> = store.search.search(&SearchQuery::new().with_skills(["  "]));
    assert!(matches!(result, Err(HriError::Validation(_))));
}

#[test]
fn test_on_disk_state_survives_reopen() {
    let root = TempRoot::new();
    let input = root.create_file("in/extracted.json", SAMPLE_EXTRACTION_JSON);
    {
        let ctx = root.context();
        let report = ctx.ingestor().ingest_file(&input).unwrap();
        assert_eq!(report.ingested, vec!["r-1", "r-2"]);
        assert_eq!(report.rejected.len(), 1);
    }

    let ctx = root.context();
    assert_eq!(ctx.db.count_candidates().unwrap(), 2);
    assert_eq!(ctx.vectors.len().unwrap(), 2);
    let results = ctx
        .search
        .search(&SearchQuery::new().with_text("cloud infrastructure"))
        .unwrap();
    assert_eq!(results[0].candidate.id, "r-1");
}
