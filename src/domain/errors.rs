//! Domain errors for the reconciler.
//!
//! These cover operations around a pass (storage, lookups, lifecycle). A pass
//! itself never fails; its problems are reported as diagnostics.

use thiserror::Error;

/// Domain-level errors.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Agent not found: {namespace}/{name}")]
    AgentNotFound { namespace: String, name: String },

    #[error("Agent already exists: {namespace}/{name}")]
    AgentAlreadyExists { namespace: String, name: String },

    #[error("Invalid status transition from {from} to {to}")]
    InvalidStatusTransition { from: String, to: String },

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Result of a domain operation.
pub type DomainResult<T> = Result<T, DomainError>;

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}

impl From<serde_yaml::Error> for DomainError {
    fn from(err: serde_yaml::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}
