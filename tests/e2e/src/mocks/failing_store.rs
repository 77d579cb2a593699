//! Failure-injecting snapshot store
//!
//! Wraps a [`MemorySnapshotStore`] and fails loads or saves on demand. Clones
//! share their switches, so a test can flip them while the engine owns a copy.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parley_core::storage::Result;
use parley_core::{MemorySnapshotStore, Snapshot, SnapshotStore, StorageError};

#[derive(Debug, Clone, Default)]
pub struct FailingStore {
    inner: MemorySnapshotStore,
    fail_loads: Arc<AtomicBool>,
    fail_saves: Arc<AtomicBool>,
    rejected_saves: Arc<AtomicUsize>,
}

impl FailingStore {
    /// Store that works until told otherwise
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose snapshot can never be read
    pub fn unreadable() -> Self {
        let store = Self::new();
        store.fail_loads.store(true, Ordering::SeqCst);
        store
    }

    /// Store that rejects every save
    pub fn read_only() -> Self {
        let store = Self::new();
        store.set_fail_saves(true);
        store
    }

    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Saves refused since creation
    pub fn rejected_saves(&self) -> usize {
        self.rejected_saves.load(Ordering::SeqCst)
    }

    /// Underlying store holding whatever was saved successfully
    pub fn inner(&self) -> &MemorySnapshotStore {
        &self.inner
    }
}

impl SnapshotStore for FailingStore {
    fn load(&self) -> Result<Option<Snapshot>> {
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(StorageError::Corrupt("injected load failure".to_string()));
        }
        self.inner.load()
    }

    fn save(&self, snapshot: &Snapshot) -> Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            self.rejected_saves.fetch_add(1, Ordering::SeqCst);
            return Err(StorageError::Io(std::io::Error::other("injected save failure")));
        }
        self.inner.save(snapshot)
    }

    fn describe(&self) -> String {
        "failing-memory".to_string()
    }
}
