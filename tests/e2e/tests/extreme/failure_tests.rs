//! Failure Injection Tests
//!
//! Storage faults surface as errors without losing in-memory state, unreadable
//! snapshots start empty, and a poisoned shared lock is reported, not raised.

use std::panic::{self, AssertUnwindSafe};

use parley_core::{
    CacheConfig, CacheKey, Engine, EngineConfig, EngineError, Orchestrator, SharedOrchestrator,
    SnapshotStore, StorageError,
};
use parley_e2e_tests::FailingStore;

fn orchestrator_over(store: FailingStore) -> Orchestrator {
    let engine = Engine::open(store, EngineConfig::default().with_seed(5)).unwrap();
    Orchestrator::new(engine, CacheConfig::default()).unwrap()
}

#[test]
fn test_unreadable_snapshot_means_no_prior_memory() {
    let mut orch = orchestrator_over(FailingStore::unreadable());
    assert_eq!(orch.status().engine.total_patterns, 0);

    // Saving still works, so the bot keeps functioning
    orch.teach("u1", "are you still alive", "yes").unwrap();
    assert!(orch.process_query("u1", "are you still alive").unwrap().is_match());
}

#[test]
fn test_failed_save_keeps_mutation_and_reports_error() {
    let store = FailingStore::read_only();
    let mut orch = orchestrator_over(store.clone());

    let err = orch.teach("u1", "is the disk full", "probably").unwrap_err();
    assert!(matches!(err, EngineError::Storage(StorageError::Io(_))));
    assert_eq!(orch.status().engine.total_patterns, 1);
    assert_eq!(store.rejected_saves(), 1);
    assert!(store.inner().latest().is_none());

    // Once storage recovers, an explicit flush persists what was kept
    store.set_fail_saves(false);
    orch.engine().flush().unwrap();
    let saved = store.inner().latest().unwrap();
    assert_eq!(saved.patterns.len(), 1);
}

#[test]
fn test_failed_save_during_query_is_not_cached() {
    let store = FailingStore::new();
    let mut orch = orchestrator_over(store.clone());
    orch.teach("u1", "cache me if you can", "caught").unwrap();

    store.set_fail_saves(true);
    assert!(matches!(
        orch.process_query("u1", "cache me if you can"),
        Err(EngineError::Storage(_))
    ));
    assert_eq!(orch.cache().len(), 0);

    store.set_fail_saves(false);
    let outcome = orch.process_query("u1", "cache me if you can").unwrap();
    assert_eq!(outcome.matched().unwrap().response, "caught");
    assert_eq!(orch.cache().len(), 1);
}

#[test]
fn test_failed_save_while_teaching_drops_stale_cached_answer() {
    let store = FailingStore::new();
    let mut orch = orchestrator_over(store.clone());
    let id = orch.teach("u1", "favourite colour please", "blue").unwrap();
    orch.process_query("u1", "favourite colour please").unwrap();
    let key = CacheKey::new("u1", "favourite colour please");
    assert!(orch.cache().contains(&key));

    store.set_fail_saves(true);
    assert!(matches!(
        orch.teach("u1", "favourite colour please", "green"),
        Err(EngineError::Storage(_))
    ));
    assert!(!orch.cache().contains(&key));
    assert_eq!(
        orch.engine().patterns().get(&id).unwrap().responses,
        vec!["blue", "green"]
    );

    // After recovery the next query is a fresh retrieval over both answers
    store.set_fail_saves(false);
    orch.engine().flush().unwrap();
    let misses = orch.cache().misses();
    let outcome = orch.process_query("u1", "favourite colour please").unwrap();
    let response = &outcome.matched().unwrap().response;
    assert!(response == "blue" || response == "green");
    assert_eq!(orch.cache().misses(), misses + 1);
    assert_eq!(orch.engine().patterns().get(&id).unwrap().used_count, 2);
}

#[test]
fn test_rejected_teach_keeps_cached_answer() {
    let mut orch = orchestrator_over(FailingStore::new());
    orch.teach("u1", "favourite colour please", "blue").unwrap();
    orch.process_query("u1", "favourite colour please").unwrap();

    assert!(matches!(
        orch.teach("u1", "favourite colour please", "  "),
        Err(EngineError::InvalidInput(_))
    ));
    assert!(orch.cache().contains(&CacheKey::new("u1", "favourite colour please")));
}

#[test]
fn test_invalid_input_never_reaches_storage() {
    let store = FailingStore::new();
    let mut orch = orchestrator_over(store.clone());

    for (q, r) in [("", "answer"), ("question", "   "), ("\n\t", "")] {
        assert!(matches!(orch.teach("u1", q, r), Err(EngineError::InvalidInput(_))));
    }
    assert_eq!(store.inner().save_count(), 0);
    assert!(store.load().unwrap().is_none());
}

#[test]
fn test_poisoned_lock_is_reported() {
    let shared = SharedOrchestrator::new(orchestrator_over(FailingStore::new()));
    shared.teach("u1", "before the crash", "fine").unwrap();

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        let _ = shared.with(|orch| {
            if orch.cache().is_empty() {
                panic!("host bug while holding the lock");
            }
        });
    }));
    assert!(result.is_err());

    assert!(matches!(shared.status(), Err(EngineError::Lock(_))));
    assert!(matches!(
        shared.process_query("u1", "before the crash"),
        Err(EngineError::Lock(_))
    ));
}
