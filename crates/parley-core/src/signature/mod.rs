//! Signature Module
//!
//! Sparse bag-of-hashed-words vectors and the cosine scorer used to compare them:
//! - Whitespace tokenization with lowercasing
//! - Short-token filtering (tokens of two characters or fewer carry no signal)
//! - 32-bit SHA-256 token ids (collisions are an accepted approximation)

mod hash;

pub use hash::{content_hash, token_id, TokenId};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Minimum token length (in characters) that survives vectorization
pub const DEFAULT_MIN_TOKEN_CHARS: usize = 3;

// ============================================================================
// SIGNATURE
// ============================================================================

/// Term-frequency signature: token id -> occurrence count
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signature {
    terms: BTreeMap<TokenId, u32>,
}

impl Signature {
    /// Create an empty signature
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more occurrence of a token
    pub fn add(&mut self, token: TokenId) {
        *self.terms.entry(token).or_insert(0) += 1;
    }

    /// Occurrence count for a token
    pub fn get(&self, token: TokenId) -> Option<u32> {
        self.terms.get(&token).copied()
    }

    /// Number of distinct tokens
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Iterate `(token, count)` in token order
    pub fn iter(&self) -> impl Iterator<Item = (TokenId, u32)> + '_ {
        self.terms.iter().map(|(&token, &count)| (token, count))
    }

    /// Sum of squared counts (the squared Euclidean norm)
    fn norm_squared(&self) -> f64 {
        self.terms.values().map(|&c| f64::from(c) * f64::from(c)).sum()
    }
}

impl FromIterator<TokenId> for Signature {
    fn from_iter<I: IntoIterator<Item = TokenId>>(iter: I) -> Self {
        let mut signature = Signature::new();
        for token in iter {
            signature.add(token);
        }
        signature
    }
}

// ============================================================================
// VECTORIZER
// ============================================================================

/// Vectorize text with the default minimum token length
pub fn vectorize(text: &str) -> Signature {
    vectorize_with(text, DEFAULT_MIN_TOKEN_CHARS)
}

/// Vectorize text, keeping only tokens of at least `min_chars` characters
pub fn vectorize_with(text: &str, min_chars: usize) -> Signature {
    text.to_lowercase()
        .split_whitespace()
        .filter(|word| word.chars().count() >= min_chars)
        .map(token_id)
        .collect()
}

// ============================================================================
// SIMILARITY
// ============================================================================

/// Cosine similarity between two signatures, in `[0, 1]`
///
/// The dot product runs over shared tokens; each norm runs over its own tokens.
/// Either side empty gives 0.0.
pub fn cosine(a: &Signature, b: &Signature) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let dot: f64 = small
        .iter()
        .filter_map(|(token, count)| {
            large
                .get(token)
                .map(|other| f64::from(count) * f64::from(other))
        })
        .sum();

    // sqrt of the product keeps cosine(a, a) exactly 1.0 for integer counts
    let denominator = (a.norm_squared() * b.norm_squared()).sqrt();
    if denominator == 0.0 {
        return 0.0;
    }

    (dot / denominator).clamp(0.0, 1.0)
}
