//! Domain Errors
//!
//! Error types for domain operations. None of these are fatal to a turn:
//! the application layer converts each of them into a degraded result.

use thiserror::Error;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Capability not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Network, timeout or malformed response from the language model
    #[error("Oracle error: {0}")]
    Oracle(String),

    /// A persisted capability unit could not be bound
    #[error("Failed to load capability {id}: {reason}")]
    CapabilityLoad { id: String, reason: String },

    /// A capability failed while running
    #[error("{0}")]
    Execution(String),

    #[error("Repository error: {0}")]
    Repository(String),
}

impl DomainError {
    pub fn load<I: ToString, R: ToString>(id: I, reason: R) -> Self {
        Self::CapabilityLoad {
            id: id.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn not_found<T: ToString>(id: T) -> Self {
        Self::NotFound(id.to_string())
    }
}
