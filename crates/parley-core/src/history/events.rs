//! Event Log
//!
//! Audit trail of learn and recall events, capped to the most recent entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use super::prefix;

/// Default number of events retained
pub const DEFAULT_EVENT_LOG_CAPACITY: usize = 1000;

/// What kind of event was logged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// A pattern was taught
    Learn,
    /// A pattern answered a query
    Recall,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Learn => "learn",
            EventKind::Recall => "recall",
        }
    }

    pub fn parse_name(s: &str) -> Option<Self> {
        match s {
            "learn" => Some(EventKind::Learn),
            "recall" => Some(EventKind::Recall),
            _ => None,
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single audit entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub kind: EventKind,
    /// Question prefix
    pub question: String,
    /// Response prefix
    pub response: String,
    /// Teaching user (learn events)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub user: Option<String>,
    /// Match score (recall events)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub score: Option<f64>,
    pub time: DateTime<Utc>,
}

/// Bounded FIFO of events
#[derive(Debug, Clone)]
pub struct EventLog {
    entries: VecDeque<Event>,
    capacity: usize,
    prefix_chars: usize,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_LOG_CAPACITY, super::DEFAULT_PREFIX_CHARS)
    }
}

impl EventLog {
    pub fn new(capacity: usize, prefix_chars: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity,
            prefix_chars,
        }
    }

    /// Rebuild from persisted events (oldest first), keeping the newest `capacity`
    pub fn restore(events: Vec<Event>, capacity: usize, prefix_chars: usize) -> Self {
        let mut log = Self::new(capacity, prefix_chars);
        for event in events {
            log.push(event);
        }
        log
    }

    pub fn record_learn(&mut self, question: &str, response: &str, user_id: &str) {
        self.push(Event {
            kind: EventKind::Learn,
            question: prefix(question, self.prefix_chars),
            response: prefix(response, self.prefix_chars),
            user: Some(user_id.to_string()),
            score: None,
            time: Utc::now(),
        });
    }

    pub fn record_recall(&mut self, question: &str, response: &str, score: f64) {
        self.push(Event {
            kind: EventKind::Recall,
            question: prefix(question, self.prefix_chars),
            response: prefix(response, self.prefix_chars),
            user: None,
            score: Some(score),
            time: Utc::now(),
        });
    }

    fn push(&mut self, event: Event) {
        self.entries.push_back(event);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Events oldest first
    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.entries.iter()
    }

    /// Most recent event
    pub fn last(&self) -> Option<&Event> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_vec(&self) -> Vec<Event> {
        self.entries.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
