//! Intent - per-turn classification result

use serde::{Deserialize, Serialize};

use crate::domain::CapabilityId;

/// What the classifier decided a turn is asking for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Intent {
    /// Ordinary conversation, no capability involved
    Conversation,
    /// A request mapped to a specific capability
    Command(CapabilityId),
}

impl Intent {
    pub fn is_conversation(&self) -> bool {
        matches!(self, Intent::Conversation)
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Intent::Conversation => write!(f, "conversation"),
            Intent::Command(id) => write!(f, "command {}", id),
        }
    }
}
