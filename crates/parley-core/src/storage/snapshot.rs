//! Snapshot
//!
//! The complete persisted state of an engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::associations::EdgeMap;
use crate::history::{ContextEntry, Event};
use crate::patterns::{Pattern, PatternId};

/// Current snapshot layout version
pub const SNAPSHOT_VERSION: u32 = 1;

/// Full engine state at one instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default = "default_version")]
    pub version: u32,
    pub patterns: BTreeMap<PatternId, Pattern>,
    pub associations: EdgeMap,
    /// user id -> recent exchanges, oldest first
    pub context: BTreeMap<String, Vec<ContextEntry>>,
    /// Audit events, oldest first
    pub events: Vec<Event>,
    pub saved_at: DateTime<Utc>,
}

fn default_version() -> u32 {
    SNAPSHOT_VERSION
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            patterns: BTreeMap::new(),
            associations: EdgeMap::new(),
            context: BTreeMap::new(),
            events: Vec::new(),
            saved_at: Utc::now(),
        }
    }
}

impl Snapshot {
    /// Whether the snapshot holds no learned state at all
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
            && self.associations.is_empty()
            && self.context.is_empty()
            && self.events.is_empty()
    }
}
