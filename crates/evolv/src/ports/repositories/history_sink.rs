//! History Sink Port
//!
//! Append-only text log of timestamped lines.

use async_trait::async_trait;

use crate::domain::errors::DomainError;

#[async_trait]
pub trait HistorySink: Send + Sync {
    /// Append one line (without trailing newline)
    async fn append(&self, line: &str) -> Result<(), DomainError>;

    /// Every line in append order
    async fn read_all(&self) -> Result<Vec<String>, DomainError>;
}
