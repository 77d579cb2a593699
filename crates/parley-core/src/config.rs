//! Engine Configuration
//!
//! Every tunable constant of the matching engine and the response cache, with
//! `PARLEY_*` environment overrides.

use std::str::FromStr;

use crate::associations::{DEFAULT_DECAY_FACTOR, DEFAULT_PRUNE_THRESHOLD};
use crate::history::{DEFAULT_CONTEXT_WINDOW, DEFAULT_EVENT_LOG_CAPACITY, DEFAULT_PREFIX_CHARS};
use crate::patterns::DEFAULT_CONFIDENCE_STEP;
use crate::retrieval::DEFAULT_MATCH_THRESHOLD;
use crate::signature::DEFAULT_MIN_TOKEN_CHARS;

/// Default maximum number of cached query results
pub const DEFAULT_CACHE_CAPACITY: usize = 1000;

/// Default number of oldest entries evicted when the cache overflows
pub const DEFAULT_CACHE_EVICT_BATCH: usize = 100;

/// Configuration error type
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// A value outside its allowed range
    #[error("Invalid value for {field}: {reason}")]
    OutOfRange { field: &'static str, reason: String },
}

// ============================================================================
// ENGINE CONFIG
// ============================================================================

/// Configuration for the matching engine
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Score a pattern must strictly exceed to match
    pub match_threshold: f64,
    /// Multiplier applied to every association weight per reinforcement
    pub decay_factor: f64,
    /// Associations at or below this weight are removed
    pub prune_threshold: f64,
    /// Confidence gained per repeated teaching
    pub confidence_step: f64,
    /// Shortest token (in characters) kept by the vectorizer
    pub min_token_chars: usize,
    /// Exchanges kept per user
    pub context_window: usize,
    /// Events kept in the audit log
    pub event_log_capacity: usize,
    /// Characters kept from questions/responses in summaries
    pub prefix_chars: usize,
    /// Fixed seed for response sampling (None = OS entropy)
    pub rng_seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            decay_factor: DEFAULT_DECAY_FACTOR,
            prune_threshold: DEFAULT_PRUNE_THRESHOLD,
            confidence_step: DEFAULT_CONFIDENCE_STEP,
            min_token_chars: DEFAULT_MIN_TOKEN_CHARS,
            context_window: DEFAULT_CONTEXT_WINDOW,
            event_log_capacity: DEFAULT_EVENT_LOG_CAPACITY,
            prefix_chars: DEFAULT_PREFIX_CHARS,
            rng_seed: None,
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by `PARLEY_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each `PARLEY_*` key
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        override_with(&lookup, "PARLEY_MATCH_THRESHOLD", &mut config.match_threshold);
        override_with(&lookup, "PARLEY_DECAY_FACTOR", &mut config.decay_factor);
        override_with(&lookup, "PARLEY_PRUNE_THRESHOLD", &mut config.prune_threshold);
        override_with(&lookup, "PARLEY_CONFIDENCE_STEP", &mut config.confidence_step);
        override_with(&lookup, "PARLEY_CONTEXT_WINDOW", &mut config.context_window);
        override_with(&lookup, "PARLEY_EVENT_LOG_CAPACITY", &mut config.event_log_capacity);
        if let Some(seed) = parse_var(&lookup, "PARLEY_RNG_SEED") {
            config.rng_seed = Some(seed);
        }
        config
    }

    /// Use a fixed sampling seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    /// Check every value is in range
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.match_threshold) {
            return Err(out_of_range("match_threshold", "must be within [0, 1]"));
        }
        if !(self.decay_factor > 0.0 && self.decay_factor <= 1.0) {
            return Err(out_of_range("decay_factor", "must be within (0, 1]"));
        }
        if !(0.0..1.0).contains(&self.prune_threshold) {
            return Err(out_of_range("prune_threshold", "must be within [0, 1)"));
        }
        if !(0.0..=1.0).contains(&self.confidence_step) {
            return Err(out_of_range("confidence_step", "must be within [0, 1]"));
        }
        if self.context_window == 0 {
            return Err(out_of_range("context_window", "must be at least 1"));
        }
        if self.event_log_capacity == 0 {
            return Err(out_of_range("event_log_capacity", "must be at least 1"));
        }
        Ok(())
    }
}

// ============================================================================
// CACHE CONFIG
// ============================================================================

/// Configuration for the response cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Entries allowed before eviction
    pub capacity: usize,
    /// Oldest entries dropped per overflow
    pub evict_batch: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CACHE_CAPACITY,
            evict_batch: DEFAULT_CACHE_EVICT_BATCH,
        }
    }
}

impl CacheConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        override_with(&lookup, "PARLEY_CACHE_CAPACITY", &mut config.capacity);
        override_with(&lookup, "PARLEY_CACHE_EVICT_BATCH", &mut config.evict_batch);
        config
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(out_of_range("cache capacity", "must be at least 1"));
        }
        if self.evict_batch == 0 || self.evict_batch > self.capacity {
            return Err(out_of_range("cache evict_batch", "must be within [1, capacity]"));
        }
        Ok(())
    }
}

// ============================================================================
// HELPERS
// ============================================================================

fn parse_var<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring unparsable {}={:?}", key, raw);
            None
        }
    }
}

fn override_with<F, T>(lookup: &F, key: &str, slot: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    if let Some(value) = parse_var(lookup, key) {
        *slot = value;
    }
}

fn out_of_range(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::OutOfRange {
        field,
        reason: reason.to_string(),
    }
}
