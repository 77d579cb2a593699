//! Pattern Store
//!
//! Owns the learned question -> responses patterns:
//! - Exact-text dedup (near-duplicate phrasings stay separate patterns)
//! - Append-only, de-duplicated response lists
//! - Saturating confidence that only ever grows with repeated teaching
//! - Creation-order iteration, restored from the `sequence` field on load

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::signature::{content_hash, vectorize_with, Signature, DEFAULT_MIN_TOKEN_CHARS};

/// Pattern identifier: hex SHA-256 of the question as typed
pub type PatternId = String;

/// Starting confidence of a freshly taught pattern
pub const INITIAL_CONFIDENCE: f64 = 1.0;

/// Default confidence gain per repeated teaching
pub const DEFAULT_CONFIDENCE_STEP: f64 = 0.1;

// ============================================================================
// PATTERN
// ============================================================================

/// A stored question together with its taught responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pattern {
    pub id: PatternId,
    /// First-taught form of the question
    pub question: String,
    /// Computed once at creation, never refreshed
    pub signature: Signature,
    /// Distinct responses in teaching order
    pub responses: Vec<String>,
    /// Saturating score in [0, 1]
    pub confidence: f64,
    /// Users who taught this pattern
    pub contributors: BTreeSet<String>,
    /// Times this pattern won a retrieval
    pub used_count: u64,
    /// Not consulted by matching; kept for reporting
    pub success_rate: f64,
    /// Creation index, pins iteration order
    pub sequence: u64,
    pub learned_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Pattern {
    fn new(question: &str, response: &str, user_id: &str, min_chars: usize, sequence: u64) -> Self {
        let now = Utc::now();
        Self {
            id: content_hash(question),
            question: question.to_string(),
            signature: vectorize_with(question, min_chars),
            responses: vec![response.to_string()],
            confidence: INITIAL_CONFIDENCE,
            contributors: BTreeSet::from([user_id.to_string()]),
            used_count: 0,
            success_rate: 1.0,
            sequence,
            learned_at: now,
            updated_at: now,
        }
    }

    /// Whether the exact response text is already known
    pub fn has_response(&self, response: &str) -> bool {
        self.responses.iter().any(|r| r == response)
    }
}

/// What a single `learn` call did to the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LearnOutcome {
    pub pattern_id: PatternId,
    /// A brand-new pattern was created
    pub created: bool,
    /// The response was not known before
    pub response_added: bool,
}

// ============================================================================
// PATTERN STORE
// ============================================================================

/// Creation-ordered collection of patterns with id lookup
#[derive(Debug, Clone)]
pub struct PatternStore {
    patterns: Vec<Pattern>,
    index: HashMap<PatternId, usize>,
    next_sequence: u64,
    min_token_chars: usize,
    confidence_step: f64,
}

impl Default for PatternStore {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_TOKEN_CHARS, DEFAULT_CONFIDENCE_STEP)
    }
}

impl PatternStore {
    pub fn new(min_token_chars: usize, confidence_step: f64) -> Self {
        Self {
            patterns: Vec::new(),
            index: HashMap::new(),
            next_sequence: 0,
            min_token_chars,
            confidence_step,
        }
    }

    /// Rebuild a store from persisted patterns, ordering by `sequence`
    pub fn restore(
        patterns: impl IntoIterator<Item = Pattern>,
        min_token_chars: usize,
        confidence_step: f64,
    ) -> Self {
        let mut store = Self::new(min_token_chars, confidence_step);
        let mut patterns: Vec<Pattern> = patterns.into_iter().collect();
        patterns.sort_by_key(|p| p.sequence);

        for pattern in patterns {
            store.next_sequence = store.next_sequence.max(pattern.sequence + 1);
            store.index.insert(pattern.id.clone(), store.patterns.len());
            store.patterns.push(pattern);
        }
        store
    }

    /// Teach `question -> response` on behalf of `user_id`
    pub fn learn(&mut self, question: &str, response: &str, user_id: &str) -> LearnOutcome {
        let id = content_hash(question);

        if let Some(&idx) = self.index.get(&id) {
            let pattern = &mut self.patterns[idx];
            let response_added = !pattern.has_response(response);
            if response_added {
                pattern.responses.push(response.to_string());
            }
            pattern.contributors.insert(user_id.to_string());
            pattern.confidence = (pattern.confidence + self.confidence_step).min(1.0);
            pattern.updated_at = Utc::now();

            tracing::debug!(
                pattern = %short_id(&id),
                responses = pattern.responses.len(),
                confidence = pattern.confidence,
                "Pattern reinforced"
            );

            return LearnOutcome {
                pattern_id: id,
                created: false,
                response_added,
            };
        }

        let pattern = Pattern::new(
            question,
            response,
            user_id,
            self.min_token_chars,
            self.next_sequence,
        );
        self.next_sequence += 1;
        tracing::debug!(pattern = %short_id(&id), tokens = pattern.signature.len(), "Pattern created");

        self.index.insert(id.clone(), self.patterns.len());
        self.patterns.push(pattern);

        LearnOutcome {
            pattern_id: id,
            created: true,
            response_added: true,
        }
    }

    pub fn get(&self, id: &str) -> Option<&Pattern> {
        self.index.get(id).map(|&idx| &self.patterns[idx])
    }

    /// Look up a pattern by its exact question text
    pub fn get_by_question(&self, question: &str) -> Option<&Pattern> {
        self.get(&content_hash(question))
    }

    /// Pattern at a creation-order position
    pub fn at(&self, position: usize) -> Option<&Pattern> {
        self.patterns.get(position)
    }

    /// Record a retrieval win for the pattern at `position`
    pub fn mark_used(&mut self, position: usize) -> Option<&Pattern> {
        let pattern = self.patterns.get_mut(position)?;
        pattern.used_count += 1;
        Some(pattern)
    }

    /// Patterns in creation order
    pub fn iter(&self) -> impl Iterator<Item = &Pattern> {
        self.patterns.iter()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Mean confidence, 0.0 for an empty store
    pub fn average_confidence(&self) -> f64 {
        if self.patterns.is_empty() {
            return 0.0;
        }
        self.patterns.iter().map(|p| p.confidence).sum::<f64>() / self.patterns.len() as f64
    }

    /// Persisted form: id -> pattern
    pub fn to_map(&self) -> BTreeMap<PatternId, Pattern> {
        self.patterns
            .iter()
            .map(|p| (p.id.clone(), p.clone()))
            .collect()
    }

    pub fn clear(&mut self) {
        self.patterns.clear();
        self.index.clear();
        self.next_sequence = 0;
    }
}

/// First 12 hex digits of an id, for log lines
pub(crate) fn short_id(id: &str) -> &str {
    id.get(..12).unwrap_or(id)
}
