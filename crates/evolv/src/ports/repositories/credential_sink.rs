//! Credential Registry Port
//!
//! Operator-facing side channel listing capabilities that need an API key.
//! The core only writes to it.

use async_trait::async_trait;

use crate::domain::errors::DomainError;

#[async_trait]
pub trait CredentialSink: Send + Sync {
    /// Record a provisioning note for `name`. Existing entries are kept.
    async fn record(&self, name: &str, note: &str) -> Result<(), DomainError>;
}
