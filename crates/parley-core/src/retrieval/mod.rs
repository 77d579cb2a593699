//! Retrieval Module
//!
//! Scoring and selection used by the engine when answering a query:
//! - Linear scan in creation order, score = cosine * confidence
//! - Strict threshold, earliest pattern wins ties
//! - Weighted random choice among a winner's responses

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::patterns::{Pattern, PatternId};
use crate::signature::{cosine, Signature};

/// Default score a pattern must strictly exceed to match
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.6;

// ============================================================================
// RESULT TYPES
// ============================================================================

/// Where an answer came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    /// Learned pattern memory
    #[default]
    Memory,
}

impl std::fmt::Display for ResponseSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResponseSource::Memory => write!(f, "memory"),
        }
    }
}

/// A successful retrieval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    /// Selected response text
    pub response: String,
    /// Winning score (cosine * confidence)
    pub confidence: f64,
    pub source: ResponseSource,
    /// Prefix of the matched pattern's question
    pub matched_question: String,
    pub pattern_id: PatternId,
}

/// Best candidate found by a scan
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    /// Creation-order position in the pattern store
    pub position: usize,
    pub score: f64,
}

// ============================================================================
// SCORING
// ============================================================================

/// Confidence-adjusted similarity of a query against one pattern
pub fn score(query: &Signature, pattern: &Pattern) -> f64 {
    cosine(query, &pattern.signature) * pattern.confidence
}

/// Highest-scoring pattern strictly above `threshold`
///
/// Patterns are visited in the iterator's order; a later pattern must beat the
/// current best outright, so ties keep the earlier one.
pub fn best_match<'a>(
    patterns: impl IntoIterator<Item = &'a Pattern>,
    query: &Signature,
    threshold: f64,
) -> Option<Candidate> {
    if query.is_empty() {
        return None;
    }

    let mut best: Option<Candidate> = None;
    for (position, pattern) in patterns.into_iter().enumerate() {
        let score = score(query, pattern);
        if score <= threshold {
            continue;
        }
        if best.is_none_or(|b| score > b.score) {
            best = Some(Candidate { position, score });
        }
    }
    best
}

// ============================================================================
// SELECTION
// ============================================================================

/// Pick an index proportionally to `weights`
///
/// Falls back to a uniform choice when the weights sum to zero (or cannot form
/// a distribution). `weights` must be non-empty.
pub fn select_weighted<R: Rng + ?Sized>(weights: &[f64], rng: &mut R) -> usize {
    debug_assert!(!weights.is_empty());
    if weights.len() == 1 {
        return 0;
    }

    let total: f64 = weights.iter().sum();
    if total > 0.0 {
        if let Ok(distribution) = WeightedIndex::new(weights) {
            return distribution.sample(rng);
        }
    }
    rng.gen_range(0..weights.len())
}
