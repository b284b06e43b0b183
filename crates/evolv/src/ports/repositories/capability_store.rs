//! Capability Store Port
//!
//! Persistence of capability source units under a two-level
//! `<category>/<name>` layout.

use async_trait::async_trait;

use crate::domain::{errors::DomainError, CapabilityId};

/// Storage interface for capability source units
#[async_trait]
pub trait CapabilityStore: Send + Sync {
    /// Enumerate category names
    async fn categories(&self) -> Result<Vec<String>, DomainError>;

    /// Enumerate unit names within a category
    async fn units(&self, category: &str) -> Result<Vec<String>, DomainError>;

    /// Read a unit's source text
    async fn read(&self, id: &CapabilityId) -> Result<String, DomainError>;

    /// Whether a unit exists at this identity
    async fn exists(&self, id: &CapabilityId) -> Result<bool, DomainError>;

    /// Write a unit only if the identity is free.
    ///
    /// Returns `false`, writing nothing, when a unit already exists.
    async fn create(&self, id: &CapabilityId, source: &str) -> Result<bool, DomainError>;
}
