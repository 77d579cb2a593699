//! Journey: teach, then ask
//!
//! A user teaches the bot a handful of facts and other users ask about them,
//! exactly and with rephrasings.

use parley_core::{QueryOutcome, ResponseSource, NO_MATCH_SUGGESTION};
use parley_e2e_tests::{StoreBackend, TestDataFactory, TestEngineManager};

#[test]
fn test_exact_question_returns_taught_answer() {
    let mut env = TestEngineManager::new_temp(StoreBackend::Json);
    env.seed_pairs("teacher", &TestDataFactory::qa_pairs());

    for (question, answer) in TestDataFactory::qa_pairs() {
        let outcome = env.orchestrator.process_query("student", question).unwrap();
        let result = outcome.matched().expect("taught question should match");
        assert_eq!(result.response, answer);
        assert_eq!(result.confidence, 1.0);
        assert_eq!(result.source, ResponseSource::Memory);
        assert_eq!(result.matched_question, question);
    }
}

#[test]
fn test_rephrased_question_matches() {
    let mut env = TestEngineManager::new_temp(StoreBackend::Json);
    env.seed_pairs("teacher", &[("what is the capital of france", "Paris")]);

    // 3 of 4 kept tokens shared: cosine 0.75
    let outcome = env
        .orchestrator
        .process_query("student", "tell me the capital of france")
        .unwrap();
    let result = outcome.matched().unwrap();
    assert_eq!(result.response, "Paris");
    assert!((result.confidence - 0.75).abs() < 1e-12);
}

#[test]
fn test_weak_overlap_is_not_a_match() {
    let mut env = TestEngineManager::new_temp(StoreBackend::Json);
    env.seed_pairs("teacher", &[("what is the capital of france", "Paris")]);

    // 2 of 4: cosine ~0.707, clears the threshold
    assert!(env.orchestrator.process_query("s", "the capital").unwrap().is_match());

    // 1 of 4: cosine 0.5
    let outcome = env.orchestrator.process_query("s", "capital").unwrap();
    assert_eq!(
        outcome,
        QueryOutcome::NoMatch {
            suggestion: NO_MATCH_SUGGESTION.to_string()
        }
    );
}

#[test]
fn test_unknown_question_asks_to_be_taught() {
    let mut env = TestEngineManager::new_temp(StoreBackend::Json);
    env.seed_pairs("teacher", &TestDataFactory::qa_pairs());

    let outcome = env
        .orchestrator
        .process_query("student", "explain quantum chromodynamics")
        .unwrap();
    assert!(!outcome.is_match());
    assert!(env.orchestrator.context("student").is_empty());
}

#[test]
fn test_repeated_teaching_caps_confidence() {
    let mut env = TestEngineManager::new_temp(StoreBackend::Json);
    for _ in 0..6 {
        env.seed_pairs("teacher", &[("who wrote hamlet", "William Shakespeare")]);
    }

    assert_eq!(env.pattern_count(), 1);
    let pattern = env
        .engine()
        .patterns()
        .get_by_question("who wrote hamlet")
        .unwrap();
    assert_eq!(pattern.confidence, 1.0);
    assert_eq!(pattern.responses.len(), 1);
    assert!(pattern.contributors.contains("teacher"));
}

#[test]
fn test_context_window_keeps_last_twenty() {
    let mut env = TestEngineManager::new_temp(StoreBackend::Json);
    let questions = TestDataFactory::distinct_questions(25);
    for (i, q) in questions.iter().enumerate() {
        env.orchestrator.teach("teacher", q, &format!("answer{i}")).unwrap();
    }
    for q in &questions {
        assert!(env.orchestrator.process_query("reader", q).unwrap().is_match());
    }

    let context = env.orchestrator.context("reader");
    assert_eq!(context.len(), 20);
    assert_eq!(context[0].question, questions[5]);
    assert_eq!(context[19].response, "answer24");
}

#[test]
fn test_stats_track_activity() {
    let mut env = TestEngineManager::new_temp(StoreBackend::Json);
    env.seed_pairs("teacher", &TestDataFactory::qa_pairs());
    env.orchestrator.process_query("alice", "who wrote hamlet").unwrap();
    env.orchestrator.process_query("bob", "who wrote hamlet").unwrap();
    env.orchestrator.process_query("bob", "nothing like this").unwrap();

    let status = env.orchestrator.status();
    assert_eq!(status.engine.total_patterns, 5);
    assert_eq!(status.engine.total_associations, 5);
    // five learns and two recalls
    assert_eq!(status.engine.event_log_len, 7);
    assert_eq!(status.engine.unique_users, 2);
    assert_eq!(status.engine.average_confidence, 1.0);
    assert_eq!(status.cache_size, 2);
    assert!(status.active);
}
