//! Capability Runtime Port
//!
//! Pluggable loader that turns persisted source text into something
//! invocable. The host never links generated code into its own process;
//! a runtime decides how a unit is isolated (subprocess, sandbox, ...).

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{errors::DomainError, CapabilityId};

/// A bound, callable capability unit
#[async_trait]
pub trait Invocable: Send + Sync {
    /// Run the unit and return its textual result
    async fn invoke(&self, args: &[String]) -> Result<String, DomainError>;
}

/// Loader and dialect description for capability source
#[async_trait]
pub trait CapabilityRuntime: Send + Sync {
    /// Language the oracle is asked to write, e.g. "POSIX shell (sh)"
    fn language(&self) -> &str;

    /// File extension of persisted units, without the dot
    fn extension(&self) -> &str;

    /// Whether `source` contains a definition of function `name`
    fn defines_function(&self, source: &str, name: &str) -> bool;

    /// Validate `source` and bind its function `id.name()`.
    ///
    /// Returns `DomainError::CapabilityLoad` when the unit is malformed.
    async fn bind(
        &self,
        id: &CapabilityId,
        source: &str,
    ) -> Result<Arc<dyn Invocable>, DomainError>;

    /// Hardcoded implementation for well-known names
    fn builtin_source(&self, name: &str) -> Option<String>;

    /// Unit whose invocation always reports "not implemented"
    fn stub_source(&self, name: &str) -> String;
}
