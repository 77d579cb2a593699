//! Association Graph
//!
//! Per-pattern weights over alternative responses. Every reinforcement bumps
//! one edge by 1.0 and then decays the whole graph, so edges that are not
//! reinforced fade relative to the ones that are. Edges at or below the prune
//! threshold are dropped, which also bounds graph growth.

use std::collections::BTreeMap;

use crate::patterns::PatternId;
use crate::signature::content_hash;

/// Response identifier: hex SHA-256 of the response text
pub type ResponseId = String;

/// Persisted form: pattern id -> response id -> weight
pub type EdgeMap = BTreeMap<PatternId, BTreeMap<ResponseId, f64>>;

/// Default multiplicative decay applied after every reinforcement
pub const DEFAULT_DECAY_FACTOR: f64 = 0.99;

/// Default weight at or below which an edge is removed
pub const DEFAULT_PRUNE_THRESHOLD: f64 = 0.01;

/// Weight assumed for a response that has no edge
pub const DEFAULT_EDGE_WEIGHT: f64 = 1.0;

/// Decaying pattern -> response weight graph
#[derive(Debug, Clone)]
pub struct AssociationGraph {
    edges: EdgeMap,
    decay_factor: f64,
    prune_threshold: f64,
}

impl Default for AssociationGraph {
    fn default() -> Self {
        Self::new(DEFAULT_DECAY_FACTOR, DEFAULT_PRUNE_THRESHOLD)
    }
}

impl AssociationGraph {
    pub fn new(decay_factor: f64, prune_threshold: f64) -> Self {
        Self {
            edges: BTreeMap::new(),
            decay_factor,
            prune_threshold,
        }
    }

    /// Rebuild from persisted edges, dropping anything that violates the prune invariant
    pub fn restore(edges: EdgeMap, decay_factor: f64, prune_threshold: f64) -> Self {
        let mut graph = Self {
            edges,
            decay_factor,
            prune_threshold,
        };
        graph.prune();
        graph
    }

    /// Reinforce `(pattern, response)`, then decay and prune the whole graph
    ///
    /// Returns the pair's weight after decay (0.0 if it was pruned).
    pub fn reinforce(&mut self, pattern_id: &str, response: &str) -> f64 {
        let response_id = content_hash(response);

        *self
            .edges
            .entry(pattern_id.to_string())
            .or_default()
            .entry(response_id.clone())
            .or_insert(0.0) += 1.0;

        self.decay();

        self.weight_by_id(pattern_id, &response_id).unwrap_or(0.0)
    }

    /// Multiply every weight by the decay factor and prune
    fn decay(&mut self) {
        let factor = self.decay_factor;
        for targets in self.edges.values_mut() {
            for weight in targets.values_mut() {
                *weight *= factor;
            }
        }
        self.prune();
    }

    fn prune(&mut self) {
        let threshold = self.prune_threshold;
        let before = self.edge_count();
        self.edges.retain(|_, targets| {
            targets.retain(|_, weight| *weight > threshold);
            !targets.is_empty()
        });
        let removed = before - self.edge_count();
        if removed > 0 {
            tracing::debug!(removed, "Pruned faded associations");
        }
    }

    /// Current weight for a response text under a pattern
    pub fn weight(&self, pattern_id: &str, response: &str) -> Option<f64> {
        self.weight_by_id(pattern_id, &content_hash(response))
    }

    pub fn weight_by_id(&self, pattern_id: &str, response_id: &str) -> Option<f64> {
        self.edges.get(pattern_id)?.get(response_id).copied()
    }

    /// Sampling weights for a pattern's responses, defaulting absent edges to 1.0
    pub fn response_weights(&self, pattern_id: &str, responses: &[String]) -> Vec<f64> {
        let targets = self.edges.get(pattern_id);
        responses
            .iter()
            .map(|response| {
                targets
                    .and_then(|t| t.get(&content_hash(response)).copied())
                    .unwrap_or(DEFAULT_EDGE_WEIGHT)
            })
            .collect()
    }

    /// All edges leaving a pattern
    pub fn edges_for(&self, pattern_id: &str) -> Option<&BTreeMap<ResponseId, f64>> {
        self.edges.get(pattern_id)
    }

    /// Total number of edges in the graph
    pub fn edge_count(&self) -> usize {
        self.edges.values().map(BTreeMap::len).sum()
    }

    /// Number of patterns with at least one edge
    pub fn pattern_count(&self) -> usize {
        self.edges.len()
    }

    pub fn as_map(&self) -> &EdgeMap {
        &self.edges
    }

    pub fn clear(&mut self) {
        self.edges.clear();
    }
}
