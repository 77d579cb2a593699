//! Orchestrator
//!
//! Front door for hosts: memoizes `(user, query)` answers in a bounded
//! [`ResponseCache`] in front of the [`Engine`], and turns "no match" into a
//! teachable suggestion. [`SharedOrchestrator`] serialises access for
//! multi-threaded hosts.

mod cache;

pub use cache::{CacheKey, ResponseCache};

use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::config::CacheConfig;
use crate::engine::{Engine, EngineError, EngineStats, Result};
use crate::history::ContextEntry;
use crate::patterns::PatternId;
use crate::retrieval::MatchResult;

/// Suggestion returned when nothing learned matches a query
pub const NO_MATCH_SUGGESTION: &str = "I don't know the answer to that yet. Will you teach me?";

/// Answer to a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueryOutcome {
    Matched(MatchResult),
    NoMatch { suggestion: String },
}

impl QueryOutcome {
    fn no_match() -> Self {
        QueryOutcome::NoMatch {
            suggestion: NO_MATCH_SUGGESTION.to_string(),
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, QueryOutcome::Matched(_))
    }

    /// Matched result, if any
    pub fn matched(&self) -> Option<&MatchResult> {
        match self {
            QueryOutcome::Matched(result) => Some(result),
            QueryOutcome::NoMatch { .. } => None,
        }
    }
}

/// Engine stats plus cache counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestratorStatus {
    #[serde(flatten)]
    pub engine: EngineStats,
    pub cache_size: usize,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub active: bool,
}

// ============================================================================
// ORCHESTRATOR
// ============================================================================

#[derive(Debug)]
pub struct Orchestrator {
    engine: Engine,
    cache: ResponseCache,
}

impl Orchestrator {
    pub fn new(engine: Engine, cache_config: CacheConfig) -> Result<Self> {
        cache_config.validate()?;
        Ok(Self {
            engine,
            cache: ResponseCache::new(cache_config),
        })
    }

    /// Answer `query` for `user_id`, from the cache when possible
    pub fn process_query(&mut self, user_id: &str, query: &str) -> Result<QueryOutcome> {
        let key = CacheKey::new(user_id, query);

        if let Some(cached) = self.cache.lookup(&key) {
            tracing::debug!(user = user_id, "Cache hit");
            return Ok(QueryOutcome::Matched(cached));
        }
        tracing::debug!(user = user_id, "Cache miss");

        match self.engine.retrieve(query, Some(user_id))? {
            Some(result) => {
                self.cache.insert(key, result.clone());
                Ok(QueryOutcome::Matched(result))
            }
            None => Ok(QueryOutcome::no_match()),
        }
    }

    /// Teach `question -> response`, dropping any stale cached answer for this user
    ///
    /// A storage failure still leaves the lesson in memory, so the cached
    /// answer is dropped in that case too.
    pub fn teach(&mut self, user_id: &str, question: &str, response: &str) -> Result<PatternId> {
        let learned = self.engine.learn(question, response, user_id);
        if matches!(learned, Ok(_) | Err(EngineError::Storage(_)))
            && self.cache.invalidate(&CacheKey::new(user_id, question))
        {
            tracing::debug!(user = user_id, "Invalidated cached answer");
        }
        learned
    }

    pub fn status(&self) -> OrchestratorStatus {
        OrchestratorStatus {
            engine: self.engine.stats(),
            cache_size: self.cache.len(),
            cache_hits: self.cache.hits(),
            cache_misses: self.cache.misses(),
            active: true,
        }
    }

    pub fn context(&self, user_id: &str) -> Vec<ContextEntry> {
        self.engine.context(user_id).to_vec()
    }

    /// Clear the cache and all engine state
    pub fn reset(&mut self) -> Result<()> {
        self.cache.clear();
        self.engine.reset()
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn into_engine(self) -> Engine {
        self.engine
    }
}

// ============================================================================
// SHARED ORCHESTRATOR
// ============================================================================

/// Thread-safe orchestrator; every operation holds one lock end to end
#[derive(Debug)]
pub struct SharedOrchestrator {
    inner: Mutex<Orchestrator>,
}

impl SharedOrchestrator {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            inner: Mutex::new(orchestrator),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Orchestrator>> {
        self.inner
            .lock()
            .map_err(|e| EngineError::Lock(e.to_string()))
    }

    pub fn process_query(&self, user_id: &str, query: &str) -> Result<QueryOutcome> {
        self.lock()?.process_query(user_id, query)
    }

    pub fn teach(&self, user_id: &str, question: &str, response: &str) -> Result<PatternId> {
        self.lock()?.teach(user_id, question, response)
    }

    pub fn status(&self) -> Result<OrchestratorStatus> {
        Ok(self.lock()?.status())
    }

    pub fn context(&self, user_id: &str) -> Result<Vec<ContextEntry>> {
        Ok(self.lock()?.context(user_id))
    }

    pub fn reset(&self) -> Result<()> {
        self.lock()?.reset()
    }

    /// Run `f` with exclusive access to the orchestrator
    pub fn with<T>(&self, f: impl FnOnce(&mut Orchestrator) -> T) -> Result<T> {
        Ok(f(&mut *self.lock()?))
    }
}

impl From<Orchestrator> for SharedOrchestrator {
    fn from(orchestrator: Orchestrator) -> Self {
        Self::new(orchestrator)
    }
}
