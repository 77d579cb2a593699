//! Test doubles and data generators

mod failing_store;

pub use failing_store::FailingStore;
pub use fixtures::TestDataFactory;
