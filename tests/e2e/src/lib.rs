//! Parley End-to-End Test Support
//!
//! Shared harness and mocks for the journey and extreme test targets.

pub mod mocks;

pub use harness::{StoreBackend, TestEngineManager};
pub use mocks::{FailingStore, TestDataFactory};
