//! Language-Model Oracle Port
//!
//! One prompt in, one reply out. The core treats the oracle as a best-effort
//! collaborator: every call site degrades on `DomainError::Oracle` instead of
//! propagating it.

use async_trait::async_trait;

use crate::domain::errors::DomainError;

/// Text-completion oracle
#[async_trait]
pub trait LlmOracle: Send + Sync {
    /// Reply text for `prompt`; a transport or provider failure is
    /// `DomainError::Oracle`
    async fn complete(&self, prompt: &str) -> Result<String, DomainError>;

    /// Provider name (e.g., "openai", "gemini")
    fn provider_name(&self) -> &str;

    fn model_id(&self) -> &str;
}
