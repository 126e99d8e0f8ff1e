use lexis_core::tokenizer::normalize;
use lexis_core::vector::{cosine_similarity, query_vector};
use lexis_core::{DocId, IndexError, SearchEngine};
use std::collections::BTreeSet;
use std::fs;
use std::sync::Arc;
use tempfile::tempdir;

const CORPUS: [&str; 3] =
    ["the cat sat on the mat", "dogs and cats are friends", "machine learning is fun"];

fn engine() -> SearchEngine {
    let engine = SearchEngine::new();
    engine.build(&CORPUS);
    engine
}

fn ids(results: &[(DocId, f64)]) -> BTreeSet<DocId> {
    results.iter().map(|(d, _)| *d).collect()
}

fn assert_sorted(results: &[(DocId, f64)]) {
    assert!(results.windows(2).all(|w| w[0].1 >= w[1].1), "not sorted: {results:?}");
}

#[test]
fn cat_stem_is_indexed_for_first_document() {
    let engine = engine();
    let info = engine.inspect_term("cat").expect("cat is indexed");
    assert!(info.postings.contains_key(&0));
    assert_eq!(info.document_frequency, info.postings.len());
    assert!(info.idf > 0.0);
}

#[test]
fn boolean_and_narrows_to_shared_documents() {
    let results = engine().search_boolean("cat AND mat");
    assert_eq!(ids(&results), BTreeSet::from([0]));
}

#[test]
fn boolean_or_unites_and_ranks_by_literal_query() {
    let engine = engine();
    let results = engine.search_boolean("cat OR machine");
    // "cats" in document 1 stems to "cat" as well.
    assert_eq!(ids(&results), BTreeSet::from([0, 1, 2]));
    assert_sorted(&results);

    let snap = engine.snapshot();
    let qv = query_vector("cat or machine", snap.idf());
    for (doc_id, score) in &results {
        let expected = cosine_similarity(&qv, snap.document_vector(*doc_id).unwrap());
        assert_eq!(*score, expected);
    }
}

#[test]
fn vector_search_ranks_matching_document_first() {
    let results = engine().search_vector("machine learning");
    assert_eq!(results[0].0, 2);
    assert!(results.iter().all(|(_, s)| *s > 0.0));
    assert_sorted(&results);
}

#[test]
fn unknown_terms_return_nothing() {
    let engine = engine();
    assert!(engine.search_boolean("nonexistent").is_empty());
    assert!(engine.search_vector("nonexistent").is_empty());
}

#[test]
fn boolean_set_algebra_properties() {
    let engine = engine();
    let words = ["cat", "mat", "dog", "friend", "machine", "fun", "nonexistent"];
    for a in words {
        let ra = ids(&engine.search_boolean(a));
        assert_eq!(ids(&engine.search_boolean(&format!("{a} OR {a}"))), ra);
        for b in words {
            let rb = ids(&engine.search_boolean(b));
            let and = ids(&engine.search_boolean(&format!("{a} AND {b}")));
            let or = ids(&engine.search_boolean(&format!("{a} OR {b}")));
            assert_eq!(and, ra.intersection(&rb).copied().collect::<BTreeSet<_>>());
            assert!(or.is_superset(&ra));
        }
    }
}

#[test]
fn results_stay_within_corpus_bounds() {
    let engine = engine();
    let n = engine.statistics().total_documents as DocId;
    for q in ["cat", "cat OR fun OR dog", "(friend AND cat) OR learning", "machine learning fun"] {
        let boolean = engine.search_boolean(q);
        let vector = engine.search_vector(q);
        assert_sorted(&boolean);
        assert_sorted(&vector);
        assert!(boolean.iter().chain(vector.iter()).all(|(d, _)| *d < n));
    }
}

#[test]
fn build_is_idempotent() {
    let engine = engine();
    let first = engine.snapshot();
    engine.build(&CORPUS);
    let second = engine.snapshot();
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(*first, *second);
}

#[test]
fn document_frequency_equals_postings_length() {
    let engine = engine();
    let snap = engine.snapshot();
    for term in snap.index().terms() {
        let info = snap.inspect_term(term).unwrap();
        assert_eq!(info.document_frequency, info.postings.len());
        assert!(info.idf > 0.0);
    }
}

#[test]
fn statistics_match_corpus() {
    let stats = engine().statistics();
    let tokens: usize = CORPUS.iter().map(|d| normalize(d).len()).sum();
    assert_eq!(stats.total_documents, 3);
    assert!((stats.avg_terms_per_document - tokens as f64 / 3.0).abs() < 1e-12);
}

#[test]
fn rebuild_replaces_state_wholesale() {
    let engine = engine();
    engine.build(&["quantum physics"]);
    assert!(engine.search_boolean("cat").is_empty());
    assert_eq!(engine.statistics().total_documents, 1);
    assert!(matches!(
        engine.top_terms(2, 3),
        Err(IndexError::DocumentOutOfRange { doc_id: 2, .. })
    ));
}

#[test]
fn concurrent_readers_see_whole_builds() {
    let engine = Arc::new(SearchEngine::new());
    let small: Vec<String> = vec!["alpha beta".into()];
    let large: Vec<String> = (0..50).map(|i| format!("alpha gamma document{i}")).collect();
    engine.build(&small);

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let engine = Arc::clone(&engine);
            std::thread::spawn(move || {
                for _ in 0..200 {
                    let snap = engine.snapshot();
                    let stats = snap.statistics();
                    let hits = snap.search_boolean("alpha");
                    assert_eq!(hits.len(), stats.total_documents);
                    assert!(stats.total_documents == 1 || stats.total_documents == 50);
                }
            })
        })
        .collect();
    for i in 0..20 {
        engine.build(if i % 2 == 0 { &large } else { &small });
    }
    for r in readers {
        r.join().unwrap();
    }
}

#[test]
fn loads_corpus_from_directory() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.json"), r#"[{"body": "cat mat"}, "dog"]"#).unwrap();
    fs::write(dir.path().join("b.jsonl"), "{\"content\": \"fish\"}\n\n\"bird\"\n").unwrap();
    fs::write(dir.path().join("c.txt"), "machine learning").unwrap();
    fs::write(dir.path().join("ignored.md"), "nothing").unwrap();

    let corpus = lexis_core::corpus::load_corpus(dir.path()).unwrap();
    assert_eq!(corpus, vec!["cat mat", "dog", "fish", "bird", "machine learning"]);
}

#[test]
fn invalid_document_in_file_reports_corpus_position() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.json"), r#"["one", "two"]"#).unwrap();
    fs::write(dir.path().join("b.json"), r#"["three", {"body": 7}]"#).unwrap();
    let err = lexis_core::corpus::load_corpus(dir.path()).unwrap_err();
    assert!(matches!(err, IndexError::InvalidDocument { position: 3, .. }));
}
