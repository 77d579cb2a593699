//! Context Memory
//!
//! Per-user window of the most recent matched exchanges, oldest first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default number of exchanges kept per user
pub const DEFAULT_CONTEXT_WINDOW: usize = 20;

/// One matched exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextEntry {
    pub question: String,
    pub response: String,
    pub time: DateTime<Utc>,
}

/// Rolling per-user exchange history
#[derive(Debug, Clone)]
pub struct ContextMemory {
    windows: BTreeMap<String, Vec<ContextEntry>>,
    capacity: usize,
}

impl Default for ContextMemory {
    fn default() -> Self {
        Self::new(DEFAULT_CONTEXT_WINDOW)
    }
}

impl ContextMemory {
    pub fn new(capacity: usize) -> Self {
        Self {
            windows: BTreeMap::new(),
            capacity,
        }
    }

    /// Rebuild from persisted windows, re-applying the bound
    pub fn restore(windows: BTreeMap<String, Vec<ContextEntry>>, capacity: usize) -> Self {
        let mut memory = Self { windows, capacity };
        for window in memory.windows.values_mut() {
            truncate_front(window, capacity);
        }
        memory
    }

    /// Append an exchange for `user_id`, dropping the oldest beyond the window
    pub fn record(&mut self, user_id: &str, question: &str, response: &str) {
        let window = self.windows.entry(user_id.to_string()).or_default();
        window.push(ContextEntry {
            question: question.to_string(),
            response: response.to_string(),
            time: Utc::now(),
        });
        truncate_front(window, self.capacity);
    }

    /// A user's exchanges, oldest first (empty for unknown users)
    pub fn get(&self, user_id: &str) -> &[ContextEntry] {
        self.windows.get(user_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of users with any recorded context
    pub fn user_count(&self) -> usize {
        self.windows.len()
    }

    pub fn as_map(&self) -> &BTreeMap<String, Vec<ContextEntry>> {
        &self.windows
    }

    pub fn clear(&mut self) {
        self.windows.clear();
    }
}

fn truncate_front<T>(items: &mut Vec<T>, capacity: usize) {
    if items.len() > capacity {
        let excess = items.len() - capacity;
        items.drain(..excess);
    }
}
