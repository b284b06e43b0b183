//! Capability - a named, executable unit of behavior

use std::sync::Arc;

use crate::domain::{errors::DomainError, CapabilityId};
use crate::ports::Invocable;

/// A bound capability: its identity, source text and invocable handle
#[derive(Clone)]
pub struct Capability {
    id: CapabilityId,
    source: String,
    handle: Arc<dyn Invocable>,
}

impl Capability {
    pub fn new(id: CapabilityId, source: impl Into<String>, handle: Arc<dyn Invocable>) -> Self {
        Self {
            id,
            source: source.into(),
            handle,
        }
    }

    pub fn id(&self) -> &CapabilityId {
        &self.id
    }

    /// Source text as persisted; opaque to the core
    pub fn source(&self) -> &str {
        &self.source
    }

    pub async fn invoke(&self, args: &[String]) -> Result<String, DomainError> {
        self.handle.invoke(args).await
    }
}

impl std::fmt::Debug for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capability")
            .field("id", &self.id)
            .field("source_len", &self.source.len())
            .finish()
    }
}
