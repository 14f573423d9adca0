// Offline Queue Core - Domain Logic & Ports
// NO infrastructure dependencies (storage adapters live in infra crates)

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod port;

pub use application::{OfflineQueueService, QueueStats};
pub use config::QueueConfig;
pub use domain::{EnqueueRequest, HttpMethod, QueuedRequest, RequestKey};
pub use error::{AppError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
