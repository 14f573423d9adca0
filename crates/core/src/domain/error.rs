// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Unknown HTTP method: {0}")]
    UnknownMethod(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
