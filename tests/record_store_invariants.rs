//! Record Store Invariant Tests
//!
//! Tests for invariants:
//! - Insert applies defaults and returns the caller's id
//! - student_id is unique, including under concurrent inserts
//! - student_id is immutable through update
//! - Pages partition the collection in ascending order
//! - update/delete report counts and never fail on absence

use std::sync::{Arc, Barrier};
use std::thread;

use rosterdb::students::{
    NewStudent, Page, RecordError, Scores, StoreConfig, StudentPatch, StudentStore,
};
use serde_json::json;

// =============================================================================
// Test Utilities
// =============================================================================

fn seeded_store(n: usize) -> StudentStore {
    let store = StudentStore::in_memory();
    // Insert out of order so ordering comes from the store
    for i in (1..=n).rev() {
        store
            .insert(NewStudent::new(format!("S{:03}", i), "First", "Last", 20))
            .unwrap();
    }
    store
}

// =============================================================================
// Insert
// =============================================================================

#[test]
fn test_insert_then_get_yields_document_with_defaults() {
    let store = StudentStore::in_memory();
    let inserted = store
        .insert_document(&json!({
            "student_id": "S001",
            "first_name": "Ann",
            "last_name": "Lee",
            "age": 20
        }))
        .unwrap();
    assert_eq!(inserted, "S001");

    let student = store.get("S001").unwrap().unwrap();
    assert_eq!(
        serde_json::to_value(&student).unwrap(),
        json!({
            "student_id": "S001",
            "first_name": "Ann",
            "last_name": "Lee",
            "age": 20,
            "scores": {},
            "active": true
        })
    );
}

#[test]
fn test_explicit_optional_fields_are_kept() {
    let store = StudentStore::in_memory();
    let scores = Scores::from([("db".to_string(), 77)]);
    store
        .insert(
            NewStudent::new("S001", "Ann", "Lee", 20)
                .with_scores(scores.clone())
                .with_active(false),
        )
        .unwrap();

    let student = store.get("S001").unwrap().unwrap();
    assert_eq!(student.scores, scores);
    assert!(!student.active);
}

#[test]
fn test_missing_fields_reported_in_order() {
    let store = StudentStore::in_memory();
    let cases = [
        (json!({"first_name": "Ann", "last_name": "Lee", "age": 20}), "student_id"),
        (json!({"student_id": "S001", "last_name": "Lee", "age": 20}), "first_name"),
        (json!({"student_id": "S001", "first_name": "Ann", "age": 20}), "last_name"),
        (json!({"student_id": "S001", "first_name": "Ann", "last_name": "Lee"}), "age"),
    ];

    for (document, field) in cases {
        let err = store.insert_document(&document).unwrap_err();
        assert_eq!(err, RecordError::missing(field));
    }
    assert_eq!(store.count().unwrap(), 0);
}

// =============================================================================
// Uniqueness
// =============================================================================

#[test]
fn test_duplicate_insert_fails_without_mutation() {
    let store = StudentStore::in_memory();
    store.insert(NewStudent::new("S001", "Ann", "Lee", 20)).unwrap();

    let err = store
        .insert(NewStudent::new("S001", "Other", "Person", 40))
        .unwrap_err();

    assert!(matches!(err, RecordError::DuplicateKey { ref student_id } if student_id == "S001"));
    assert_eq!(store.count().unwrap(), 1);
    assert_eq!(store.get("S001").unwrap().unwrap().first_name, "Ann");
}

#[test]
fn test_concurrent_inserts_of_one_id_admit_exactly_one() {
    const THREADS: usize = 16;

    let store = Arc::new(StudentStore::in_memory());
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let store = Arc::clone(&store);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                store.insert(NewStudent::new("S001", format!("T{}", i), "Racer", 20))
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let successes = results.iter().filter(|r| r.is_ok()).count();
    let duplicates = results
        .iter()
        .filter(|r| matches!(r, Err(RecordError::DuplicateKey { .. })))
        .count();

    assert_eq!(successes, 1);
    assert_eq!(duplicates, THREADS - 1);
    assert_eq!(store.count().unwrap(), 1);
    assert_eq!(store.metrics().snapshot().duplicate_rejections, (THREADS - 1) as u64);
}

#[test]
fn test_concurrent_inserts_of_distinct_ids_all_land() {
    let store = Arc::new(StudentStore::in_memory());

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..25 {
                    store
                        .insert(NewStudent::new(format!("T{}-{:02}", t, i), "A", "B", 20))
                        .unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(store.count().unwrap(), 200);
}

// =============================================================================
// Update
// =============================================================================

#[test]
fn test_update_drops_student_id_and_changes_age_only() {
    let store = StudentStore::in_memory();
    store.insert(NewStudent::new("S001", "Ann", "Lee", 20)).unwrap();
    let before = store.get("S001").unwrap().unwrap();

    let outcome = store
        .update_document("S001", &json!({"student_id": "other", "age": 30}))
        .unwrap();
    assert_eq!((outcome.matched_count, outcome.modified_count), (1, 1));

    assert!(store.get("other").unwrap().is_none());
    let after = store.get("S001").unwrap().unwrap();
    assert_eq!(after.age, 30);
    assert_eq!(after.first_name, before.first_name);
    assert_eq!(after.last_name, before.last_name);
    assert_eq!(after.scores, before.scores);
    assert_eq!(after.active, before.active);
}

#[test]
fn test_update_subject_path_changes_only_that_score() {
    let store = StudentStore::in_memory();
    store
        .insert(NewStudent::new("S001", "Ann", "Lee", 20).with_scores(Scores::from([
            ("math".to_string(), 60),
            ("cs".to_string(), 70),
            ("db".to_string(), 80),
        ])))
        .unwrap();

    store
        .update_document("S001", &json!({"scores.math": 99}))
        .unwrap();

    let student = store.get("S001").unwrap().unwrap();
    assert_eq!(
        student.scores,
        Scores::from([
            ("math".to_string(), 99),
            ("cs".to_string(), 70),
            ("db".to_string(), 80),
        ])
    );
}

#[test]
fn test_update_new_subject_adds_score() {
    let store = StudentStore::in_memory();
    store.insert(NewStudent::new("S001", "Ann", "Lee", 20)).unwrap();

    store
        .update("S001", &StudentPatch::new().set_score("physics", 88))
        .unwrap();
    assert_eq!(store.get("S001").unwrap().unwrap().scores["physics"], 88);
}

#[test]
fn test_update_nonexistent_reports_zero_without_failing() {
    let store = StudentStore::in_memory();
    let outcome = store
        .update_document("missing", &json!({"age": 30}))
        .unwrap();
    assert_eq!((outcome.matched_count, outcome.modified_count), (0, 0));
    assert_eq!(store.count().unwrap(), 0);
}

#[test]
fn test_invalid_update_leaves_record_untouched() {
    let store = StudentStore::in_memory();
    store.insert(NewStudent::new("S001", "Ann", "Lee", 20)).unwrap();

    let err = store
        .update_document("S001", &json!({"age": 31, "grade": "A"}))
        .unwrap_err();
    assert_eq!(err.field(), Some("grade"));
    assert_eq!(store.get("S001").unwrap().unwrap().age, 20);

    let err = store.update("S001", &StudentPatch::new().age(-1)).unwrap_err();
    assert_eq!(err.field(), Some("age"));
}

// =============================================================================
// Delete
// =============================================================================

#[test]
fn test_delete_twice_reports_one_then_zero() {
    let store = seeded_store(3);

    assert_eq!(store.delete("S002").unwrap().deleted_count, 1);
    assert_eq!(store.delete("S002").unwrap().deleted_count, 0);
    assert!(store.get("S002").unwrap().is_none());
    assert_eq!(store.count().unwrap(), 2);
}

// =============================================================================
// List
// =============================================================================

#[test]
fn test_pages_partition_collection_in_order() {
    let store = seeded_store(23);
    let k = 5;

    let mut seen = Vec::new();
    let mut page = Page::new(k, 0);
    loop {
        let batch = store.list(page).unwrap();
        if batch.is_empty() {
            break;
        }
        assert!(batch.len() <= k);
        seen.extend(batch.into_iter().map(|s| s.student_id));
        page = page.next();
    }

    let expected: Vec<_> = (1..=23).map(|i| format!("S{:03}", i)).collect();
    assert_eq!(seen, expected);
}

#[test]
fn test_list_is_stable_on_unchanged_data() {
    let store = seeded_store(10);
    let first = store.list(Page::new(4, 3)).unwrap();
    let second = store.list(Page::new(4, 3)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_list_orders_bytewise() {
    let store = StudentStore::in_memory();
    for id in ["b", "B", "a10", "a2"] {
        store.insert(NewStudent::new(id, "F", "L", 1)).unwrap();
    }

    let ids: Vec<_> = store
        .list(Page::default())
        .unwrap()
        .into_iter()
        .map(|s| s.student_id)
        .collect();
    assert_eq!(ids, ["B", "a10", "a2", "b"]);
}

#[test]
fn test_list_limit_clamped_and_negatives_rejected() {
    let store = StudentStore::open(&StoreConfig::in_memory().with_max_page_limit(3)).unwrap();
    for i in 1..=5 {
        store
            .insert(NewStudent::new(format!("S{}", i), "F", "L", 1))
            .unwrap();
    }

    assert_eq!(store.list(Page::new(100, 0)).unwrap().len(), 3);
    assert!(store.list(Page::new(0, 0)).unwrap().is_empty());

    let err = Page::from_params(Some(-1), None).unwrap_err();
    assert_eq!(err.field(), Some("limit"));
}
