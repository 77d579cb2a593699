//! Storage Module
//!
//! Persistence port for the engine's state plus three adapters:
//! - In-memory (tests, ephemeral bots)
//! - Single JSON document on disk
//! - SQLite with versioned migrations
//!
//! The engine writes one full [`Snapshot`] after every mutating operation and
//! reads one at startup. Adapters never interpret the snapshot beyond storing it.

mod json;
mod memory;
mod migrations;
mod snapshot;
mod sqlite;

pub use json::{JsonSnapshotStore, DEFAULT_JSON_FILE};
pub use memory::MemorySnapshotStore;
pub use migrations::{Migration, MIGRATIONS};
pub use snapshot::{Snapshot, SNAPSHOT_VERSION};
pub use sqlite::{SqliteSnapshotStore, DEFAULT_SQLITE_FILE};

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Storage error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Snapshot could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// Stored data exists but cannot be understood
    #[error("Corrupt snapshot: {0}")]
    Corrupt(String),
    /// Initialization error
    #[error("Initialization error: {0}")]
    Init(String),
    /// A lock guarding the backend was poisoned
    #[error("Storage lock poisoned: {0}")]
    Lock(String),
}

/// Storage result type
pub type Result<T> = std::result::Result<T, StorageError>;

// ============================================================================
// PORT
// ============================================================================

/// Durable home for engine snapshots
pub trait SnapshotStore: Send + Sync {
    /// Read the last saved snapshot, `None` if nothing was ever saved
    fn load(&self) -> Result<Option<Snapshot>>;

    /// Replace the stored snapshot
    fn save(&self, snapshot: &Snapshot) -> Result<()>;

    /// Short human-readable description for log lines
    fn describe(&self) -> String;
}

impl<S: SnapshotStore + ?Sized> SnapshotStore for Box<S> {
    fn load(&self) -> Result<Option<Snapshot>> {
        (**self).load()
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        (**self).save(snapshot)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Default data directory (`~/.local/share/parley` or the platform equivalent)
pub fn default_data_dir() -> Result<std::path::PathBuf> {
    directories::ProjectDirs::from("com", "parley", "parley")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| StorageError::Init("Could not determine project directories".to_string()))
}
