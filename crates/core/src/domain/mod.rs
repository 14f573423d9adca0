// Domain Layer - Pure queue entities and list semantics

pub mod error;
pub mod pending;
pub mod request;

// Re-exports
pub use error::DomainError;
pub use pending::PendingQueue;
pub use request::{EnqueueRequest, HttpMethod, QueuedRequest, RequestId, RequestKey};
