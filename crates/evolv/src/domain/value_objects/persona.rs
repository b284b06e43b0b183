//! AgentPersona - read-only persona configuration

use serde::{Deserialize, Serialize};

/// Persona injected into every composed reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentPersona {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_behavior")]
    pub behavior: String,
    #[serde(default = "default_personality")]
    pub personality: String,
}

fn default_name() -> String {
    "Assistant".to_string()
}

fn default_behavior() -> String {
    "helpful and friendly".to_string()
}

fn default_personality() -> String {
    "curious and engaging".to_string()
}

impl Default for AgentPersona {
    fn default() -> Self {
        Self {
            name: default_name(),
            behavior: default_behavior(),
            personality: default_personality(),
        }
    }
}
