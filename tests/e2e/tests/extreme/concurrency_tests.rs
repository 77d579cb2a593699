//! Concurrency Tests
//!
//! Many threads teaching and asking through one `SharedOrchestrator`.

use std::sync::Arc;
use std::thread;

use parley_core::{
    CacheConfig, Engine, EngineConfig, Orchestrator, SharedOrchestrator, SqliteSnapshotStore,
};
use parley_e2e_tests::TestDataFactory;

const THREADS: usize = 8;
const PER_THREAD: usize = 25;

fn shared_in_memory() -> Arc<SharedOrchestrator> {
    let engine = Engine::in_memory(EngineConfig::default().with_seed(77)).unwrap();
    let orchestrator = Orchestrator::new(engine, CacheConfig::default()).unwrap();
    Arc::new(SharedOrchestrator::new(orchestrator))
}

#[test]
fn test_concurrent_teaching_loses_nothing() {
    let shared = shared_in_memory();
    let questions = Arc::new(TestDataFactory::distinct_questions(THREADS * PER_THREAD));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let shared = Arc::clone(&shared);
            let questions = Arc::clone(&questions);
            thread::spawn(move || {
                let user = format!("teacher{t}");
                for q in &questions[t * PER_THREAD..(t + 1) * PER_THREAD] {
                    shared.teach(&user, q, &format!("answer for {q}")).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let status = shared.status().unwrap();
    assert_eq!(status.engine.total_patterns, THREADS * PER_THREAD);
    assert_eq!(status.engine.event_log_len, THREADS * PER_THREAD);

    for q in questions.iter() {
        let outcome = shared.process_query("checker", q).unwrap();
        assert_eq!(outcome.matched().unwrap().response, format!("answer for {q}"));
    }
}

#[test]
fn test_concurrent_queries_on_one_pattern() {
    let shared = shared_in_memory();
    let id = shared
        .teach("root", "what is the meaning of life", "forty two")
        .unwrap();

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let shared = Arc::clone(&shared);
            thread::spawn(move || {
                // distinct phrasings per thread so each one reaches the engine
                for i in 0..PER_THREAD {
                    let query = format!("what is the meaning of life asked{t}x{i}");
                    assert!(shared.process_query(&format!("user{t}"), &query).unwrap().is_match());
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let used = shared
        .with(|orch| orch.engine().patterns().get(&id).unwrap().used_count)
        .unwrap();
    assert_eq!(used as usize, THREADS * PER_THREAD);

    let status = shared.status().unwrap();
    assert_eq!(status.engine.unique_users, THREADS);
    assert_eq!(status.cache_misses as usize, THREADS * PER_THREAD);
}

#[test]
fn test_concurrent_writes_leave_a_complete_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("shared.db");

    let store = SqliteSnapshotStore::new(Some(db_path.clone())).unwrap();
    let engine = Engine::open(store, EngineConfig::default()).unwrap();
    let orchestrator = Orchestrator::new(engine, CacheConfig::default()).unwrap();
    let shared = Arc::new(SharedOrchestrator::new(orchestrator));

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let shared = Arc::clone(&shared);
            thread::spawn(move || {
                for q in TestDataFactory::distinct_questions(40).iter().skip(t * 10).take(10) {
                    shared.teach("writer", q, "stored").unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    drop(shared);

    let store = SqliteSnapshotStore::new(Some(db_path)).unwrap();
    let reopened = Engine::open(store, EngineConfig::default()).unwrap();
    assert_eq!(reopened.stats().total_patterns, 40);
    assert_eq!(reopened.stats().total_associations, 40);
}
