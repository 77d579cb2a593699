//! # Parley Core
//!
//! Self-learning response engine. Users teach `question -> response` pairs;
//! later questions are answered by the closest learned question.
//!
//! - **Hashed term vectors**: SHA-256 token ids, term-frequency signatures
//! - **Cosine matching**: confidence-weighted, strict 0.6 threshold
//! - **Association graph**: per-pattern response weights with global decay and pruning
//! - **Context memory**: last 20 exchanges per user
//! - **Event log**: bounded learn/recall audit trail
//! - **Response cache**: FIFO memoization of `(user, query)` answers
//! - **Pluggable persistence**: in-memory, JSON file, or SQLite snapshots
//!
//! ## Quick Start
//!
//! ```rust
//! use parley_core::{CacheConfig, Engine, EngineConfig, Orchestrator, QueryOutcome};
//!
//! # fn main() -> parley_core::Result<()> {
//! let engine = Engine::in_memory(EngineConfig::default())?;
//! let mut parley = Orchestrator::new(engine, CacheConfig::default())?;
//!
//! parley.teach("alice", "what is the capital of france", "Paris")?;
//!
//! match parley.process_query("bob", "what is the capital of france")? {
//!     QueryOutcome::Matched(result) => assert_eq!(result.response, "Paris"),
//!     QueryOutcome::NoMatch { suggestion } => println!("{suggestion}"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `bundled-sqlite` (default): Compile SQLite into the crate for the SQLite adapter

#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULES
// ============================================================================

pub mod associations;
pub mod config;
pub mod engine;
pub mod history;
pub mod orchestrator;
pub mod patterns;
pub mod retrieval;
pub mod signature;
pub mod storage;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Text processing
pub use signature::{content_hash, cosine, token_id, vectorize, Signature, TokenId};

// Learned state
pub use associations::{AssociationGraph, EdgeMap, ResponseId};
pub use history::{ContextEntry, ContextMemory, Event, EventKind, EventLog};
pub use patterns::{LearnOutcome, Pattern, PatternId, PatternStore};

// Matching
pub use retrieval::{MatchResult, ResponseSource};

// Engine and front door
pub use config::{CacheConfig, ConfigError, EngineConfig};
pub use engine::{Engine, EngineError, EngineStats, Result};
pub use orchestrator::{
    CacheKey, Orchestrator, OrchestratorStatus, QueryOutcome, ResponseCache, SharedOrchestrator,
    NO_MATCH_SUGGESTION,
};

// Persistence
pub use storage::{
    default_data_dir, JsonSnapshotStore, MemorySnapshotStore, Snapshot, SnapshotStore,
    SqliteSnapshotStore, StorageError, SNAPSHOT_VERSION,
};

// ============================================================================
// PRELUDE
// ============================================================================

/// Convenient imports for common usage
pub mod prelude {
    pub use crate::{
        CacheConfig, Engine, EngineConfig, EngineError, JsonSnapshotStore, MatchResult,
        MemorySnapshotStore, Orchestrator, QueryOutcome, Result, SharedOrchestrator,
        SnapshotStore, SqliteSnapshotStore,
    };
}
