//! Journey: restarts
//!
//! Everything learned survives a restart on both snapshot backends; damaged
//! snapshots start the bot with no prior memory instead of failing.

use parley_e2e_tests::{StoreBackend, TestDataFactory, TestEngineManager};

#[test]
fn test_learned_state_survives_restart() {
    for backend in StoreBackend::ALL {
        let mut env = TestEngineManager::new_temp(backend);
        let ids = env.seed_pairs("teacher", &TestDataFactory::qa_pairs());
        env.orchestrator.process_query("alice", "who wrote hamlet").unwrap();
        let before = env.orchestrator.status().engine;
        assert!(env.snapshot_path().exists(), "{backend:?} wrote no snapshot");

        let mut env = env.reopen();
        assert_eq!(env.orchestrator.status().engine, before, "{backend:?}");
        assert_eq!(env.orchestrator.context("alice").len(), 1);
        assert_eq!(env.engine().patterns().get(&ids[1]).unwrap().used_count, 1);

        let outcome = env
            .orchestrator
            .process_query("bob", "what is the capital of france")
            .unwrap();
        assert_eq!(outcome.matched().unwrap().response, "Paris", "{backend:?}");
    }
}

#[test]
fn test_association_weights_survive_restart() {
    for backend in StoreBackend::ALL {
        let mut env = TestEngineManager::new_temp(backend);
        let ids = env.seed_pairs(
            "teacher",
            &[("tabs or spaces", "tabs"), ("tabs or spaces", "spaces")],
        );
        let edges = env.engine().associations().edges_for(&ids[0]).cloned();

        let env = env.reopen();
        assert_eq!(env.engine().associations().edges_for(&ids[0]).cloned(), edges);
        assert_eq!(
            env.engine().patterns().get(&ids[0]).unwrap().responses,
            vec!["tabs", "spaces"]
        );
    }
}

#[test]
fn test_creation_order_survives_restart() {
    for backend in StoreBackend::ALL {
        let mut env = TestEngineManager::new_temp(backend);
        // Identical signatures, so every query ties and the older pattern wins
        env.seed_pairs(
            "teacher",
            &[("beta alpha gamma", "older"), ("alpha beta gamma", "newer")],
        );
        let query = "gamma alpha beta";
        let answer = |env: &mut TestEngineManager| {
            env.orchestrator
                .process_query("asker", query)
                .unwrap()
                .matched()
                .unwrap()
                .response
                .clone()
        };
        assert_eq!(answer(&mut env), "older");

        let mut env = env.reopen();
        assert_eq!(answer(&mut env), "older", "{backend:?}");
    }
}

#[test]
fn test_corrupt_json_snapshot_starts_empty() {
    let mut env = TestEngineManager::new_temp(StoreBackend::Json);
    env.seed_pairs("teacher", &TestDataFactory::qa_pairs());
    TestDataFactory::corrupt_file(&env.snapshot_path());

    let mut env = env.reopen();
    assert_eq!(env.pattern_count(), 0);
    assert!(!env
        .orchestrator
        .process_query("u1", "who wrote hamlet")
        .unwrap()
        .is_match());

    // The next save replaces the damaged file
    env.seed_pairs("teacher", &[("who wrote hamlet", "William Shakespeare")]);
    let env = env.reopen();
    assert_eq!(env.pattern_count(), 1);
}

#[test]
fn test_reset_is_persisted() {
    for backend in StoreBackend::ALL {
        let mut env = TestEngineManager::new_temp(backend);
        env.seed_pairs("teacher", &TestDataFactory::qa_pairs());
        env.orchestrator.process_query("alice", "who wrote hamlet").unwrap();
        env.orchestrator.reset().unwrap();

        let env = env.reopen();
        let stats = env.orchestrator.status().engine;
        assert_eq!(stats.total_patterns, 0, "{backend:?}");
        assert_eq!(stats.event_log_len, 0);
        assert_eq!(stats.unique_users, 0);
    }
}

#[test]
fn test_json_snapshot_is_readable_document() {
    let mut env = TestEngineManager::new_temp(StoreBackend::Json);
    let ids = env.seed_pairs("teacher", &[("who wrote hamlet", "William Shakespeare")]);

    let raw = std::fs::read_to_string(env.snapshot_path()).unwrap();
    let doc: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(doc["version"], 1);
    assert_eq!(
        doc["patterns"][&ids[0]]["responses"][0],
        "William Shakespeare"
    );
    assert!(doc["associations"][&ids[0]].is_object());
    assert!(doc["savedAt"].is_string());
}
