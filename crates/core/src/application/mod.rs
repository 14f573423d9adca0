// Application Layer - Queue core, persistence adapter and public service

pub mod expiry;
pub mod queue;
pub mod retry;
pub mod service;
pub mod shutdown;
pub mod store;

#[cfg(test)]
mod queue_test;

// Re-exports
pub use expiry::ExpirySweeper;
pub use queue::{Lifecycle, QueueStats};
pub use retry::PersistRetryPolicy;
pub use service::OfflineQueueService;
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};
pub use store::QueueStore;
