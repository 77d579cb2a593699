//! Response cache
//!
//! Bounded FIFO map of `(user, query hash) -> MatchResult`. On overflow the
//! oldest batch of entries is evicted in insertion order. Hits never touch the
//! engine, so a cached answer does not count as a use of its pattern.

use std::collections::{HashMap, VecDeque};

use crate::config::CacheConfig;
use crate::retrieval::MatchResult;
use crate::signature::content_hash;

/// Cache key: the asking user and the hash of the exact query text
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    pub user_id: String,
    pub query_hash: String,
}

impl CacheKey {
    pub fn new(user_id: &str, query: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            query_hash: content_hash(query),
        }
    }
}

#[derive(Debug)]
pub struct ResponseCache {
    entries: HashMap<CacheKey, MatchResult>,
    order: VecDeque<CacheKey>,
    capacity: usize,
    evict_batch: usize,
    hits: u64,
    misses: u64,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl ResponseCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: HashMap::with_capacity(config.capacity),
            order: VecDeque::with_capacity(config.capacity),
            capacity: config.capacity,
            evict_batch: config.evict_batch.max(1),
            hits: 0,
            misses: 0,
        }
    }

    /// Cached result for `key`, counting the hit or miss
    pub fn lookup(&mut self, key: &CacheKey) -> Option<MatchResult> {
        match self.entries.get(key) {
            Some(result) => {
                self.hits += 1;
                Some(result.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Insert or replace an entry, returning how many old entries were evicted
    ///
    /// Replacing an existing key keeps its original queue position.
    pub fn insert(&mut self, key: CacheKey, result: MatchResult) -> usize {
        if let Some(existing) = self.entries.get_mut(&key) {
            *existing = result;
            return 0;
        }

        self.order.push_back(key.clone());
        self.entries.insert(key, result);

        if self.entries.len() <= self.capacity {
            return 0;
        }

        let mut evicted = 0;
        while evicted < self.evict_batch {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            if self.entries.remove(&oldest).is_some() {
                evicted += 1;
            }
        }
        tracing::debug!(evicted, remaining = self.entries.len(), "Evicted cached responses");
        evicted
    }

    /// Drop one entry; true if it was present
    pub fn invalidate(&mut self, key: &CacheKey) -> bool {
        if self.entries.remove(key).is_none() {
            return false;
        }
        self.order.retain(|k| k != key);
        true
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Remove every entry; hit/miss counters are kept
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}
