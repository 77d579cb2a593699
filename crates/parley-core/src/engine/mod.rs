//! Engine
//!
//! Owns every piece of learned state and the persistence port:
//! - `learn`: pattern store update, association reinforcement, audit entry
//! - `retrieve`: scan, weighted response choice, context + audit entries
//! - Full snapshot flush after every mutation, before returning success
//!
//! A failed flush is reported, but the in-memory mutation is kept; the caller
//! may retry with [`Engine::flush`]. An unreadable snapshot at startup is
//! treated as "no prior memory".

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::associations::AssociationGraph;
use crate::config::{ConfigError, EngineConfig};
use crate::history::{prefix, ContextEntry, ContextMemory, EventLog};
use crate::patterns::{short_id, PatternId, PatternStore};
use crate::retrieval::{best_match, select_weighted, MatchResult, ResponseSource};
use crate::signature::vectorize_with;
use crate::storage::{MemorySnapshotStore, Snapshot, SnapshotStore, StorageError, SNAPSHOT_VERSION};

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Engine error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Snapshot could not be written (state in memory is kept)
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    /// Rejected input; nothing was mutated
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    /// A shared engine's lock was poisoned by a panicking holder
    #[error("Engine lock poisoned: {0}")]
    Lock(String),
}

/// Engine result type
pub type Result<T> = std::result::Result<T, EngineError>;

// ============================================================================
// STATISTICS
// ============================================================================

/// Dashboard counters; never read by the matching algorithm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct EngineStats {
    pub total_patterns: usize,
    pub total_associations: usize,
    pub event_log_len: usize,
    /// Users with recorded context
    pub unique_users: usize,
    /// Mean pattern confidence (0 when empty)
    pub average_confidence: f64,
}

// ============================================================================
// ENGINE
// ============================================================================

pub struct Engine {
    config: EngineConfig,
    patterns: PatternStore,
    associations: AssociationGraph,
    context: ContextMemory,
    events: EventLog,
    store: Box<dyn SnapshotStore>,
    rng: StdRng,
}

impl Engine {
    /// Open an engine over `store`, restoring whatever snapshot it holds
    pub fn open(store: impl SnapshotStore + 'static, config: EngineConfig) -> Result<Self> {
        config.validate()?;

        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut engine = Self {
            patterns: PatternStore::new(config.min_token_chars, config.confidence_step),
            associations: AssociationGraph::new(config.decay_factor, config.prune_threshold),
            context: ContextMemory::new(config.context_window),
            events: EventLog::new(config.event_log_capacity, config.prefix_chars),
            store: Box::new(store),
            rng,
            config,
        };

        match engine.store.load() {
            Ok(Some(snapshot)) => {
                engine.restore(snapshot);
                tracing::info!(
                    "Loaded {} patterns from {}",
                    engine.patterns.len(),
                    engine.store.describe()
                );
            }
            Ok(None) => {
                tracing::info!("No snapshot in {}, starting empty", engine.store.describe());
            }
            Err(e) => {
                tracing::warn!(
                    "Could not read snapshot from {}: {}; starting with no prior memory",
                    engine.store.describe(),
                    e
                );
            }
        }

        Ok(engine)
    }

    /// Engine backed by a fresh in-memory store
    pub fn in_memory(config: EngineConfig) -> Result<Self> {
        Self::open(MemorySnapshotStore::new(), config)
    }

    fn restore(&mut self, snapshot: Snapshot) {
        if snapshot.version > SNAPSHOT_VERSION {
            tracing::warn!(
                "Snapshot layout v{} is newer than supported v{}",
                snapshot.version,
                SNAPSHOT_VERSION
            );
        }

        let config = &self.config;
        self.patterns = PatternStore::restore(
            snapshot.patterns.into_values(),
            config.min_token_chars,
            config.confidence_step,
        );
        self.associations = AssociationGraph::restore(
            snapshot.associations,
            config.decay_factor,
            config.prune_threshold,
        );
        self.context = ContextMemory::restore(snapshot.context, config.context_window);
        self.events =
            EventLog::restore(snapshot.events, config.event_log_capacity, config.prefix_chars);
    }

    // ========================================================================
    // LEARNING
    // ========================================================================

    /// Teach `question -> response` on behalf of `user_id`
    ///
    /// Returns the pattern id once the snapshot is durably saved.
    pub fn learn(&mut self, question: &str, response: &str, user_id: &str) -> Result<PatternId> {
        if question.trim().is_empty() {
            return Err(EngineError::InvalidInput("question is empty".into()));
        }
        if response.trim().is_empty() {
            return Err(EngineError::InvalidInput("response is empty".into()));
        }

        let outcome = self.patterns.learn(question, response, user_id);
        let weight = self.associations.reinforce(&outcome.pattern_id, response);
        self.events.record_learn(question, response, user_id);

        tracing::debug!(
            pattern = %short_id(&outcome.pattern_id),
            created = outcome.created,
            weight,
            "Learned response"
        );

        self.flush()?;
        Ok(outcome.pattern_id)
    }

    // ========================================================================
    // RETRIEVAL
    // ========================================================================

    /// Best learned response for `question`, or `None` when nothing clears the threshold
    pub fn retrieve(&mut self, question: &str, user_id: Option<&str>) -> Result<Option<MatchResult>> {
        let query = vectorize_with(question, self.config.min_token_chars);

        let Some(candidate) = best_match(self.patterns.iter(), &query, self.config.match_threshold)
        else {
            tracing::debug!("No pattern above threshold");
            return Ok(None);
        };

        let Some(pattern) = self.patterns.mark_used(candidate.position) else {
            return Ok(None);
        };

        let index = if pattern.responses.len() > 1 {
            let weights = self
                .associations
                .response_weights(&pattern.id, &pattern.responses);
            select_weighted(&weights, &mut self.rng)
        } else {
            0
        };

        let result = MatchResult {
            response: pattern.responses[index].clone(),
            confidence: candidate.score,
            source: ResponseSource::Memory,
            matched_question: prefix(&pattern.question, self.config.prefix_chars),
            pattern_id: pattern.id.clone(),
        };

        if let Some(user_id) = user_id {
            self.context.record(user_id, question, &result.response);
        }
        self.events
            .record_recall(question, &result.response, candidate.score);

        tracing::debug!(
            pattern = %short_id(&result.pattern_id),
            score = candidate.score,
            "Recalled response"
        );

        self.flush()?;
        Ok(Some(result))
    }

    // ========================================================================
    // STATE ACCESS
    // ========================================================================

    /// Recent exchanges for a user, oldest first
    pub fn context(&self, user_id: &str) -> &[ContextEntry] {
        self.context.get(user_id)
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            total_patterns: self.patterns.len(),
            total_associations: self.associations.edge_count(),
            event_log_len: self.events.len(),
            unique_users: self.context.user_count(),
            average_confidence: self.patterns.average_confidence(),
        }
    }

    pub fn patterns(&self) -> &PatternStore {
        &self.patterns
    }

    pub fn associations(&self) -> &AssociationGraph {
        &self.associations
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Where snapshots are persisted, e.g. `json:/path/brain.json`
    pub fn describe_store(&self) -> String {
        self.store.describe()
    }

    /// Current state as a persistable snapshot
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            version: SNAPSHOT_VERSION,
            patterns: self.patterns.to_map(),
            associations: self.associations.as_map().clone(),
            context: self.context.as_map().clone(),
            events: self.events.to_vec(),
            saved_at: Utc::now(),
        }
    }

    /// Write the current state to the store
    pub fn flush(&self) -> Result<()> {
        if let Err(e) = self.store.save(&self.snapshot()) {
            tracing::warn!("Snapshot flush to {} failed: {}", self.store.describe(), e);
            return Err(e.into());
        }
        Ok(())
    }

    /// Forget everything and persist the empty state
    pub fn reset(&mut self) -> Result<()> {
        self.patterns.clear();
        self.associations.clear();
        self.context.clear();
        self.events.clear();
        tracing::info!("Engine state reset");
        self.flush()
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("store", &self.store.describe())
            .field("patterns", &self.patterns.len())
            .field("associations", &self.associations.edge_count())
            .finish_non_exhaustive()
    }
}
