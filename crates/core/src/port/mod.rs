// Port Layer - Interfaces for external dependencies

pub mod id_provider; // For deterministic testing
pub mod key_value_store;
pub mod time_provider;

// Re-exports
pub use id_provider::{IdProvider, SequentialIdProvider, UuidProvider};
pub use key_value_store::{InMemoryKeyValueStore, KeyValueStore};
pub use time_provider::{ManualTimeProvider, SystemTimeProvider, TimeProvider};
