//! Conversation Composer
//!
//! Folds capability output, the history projection and the persona into
//! the final reply with a single oracle call.

use std::sync::{Arc, OnceLock};

use regex::Regex;

use crate::domain::AgentPersona;
use crate::ports::LlmOracle;

/// Reply used when the oracle fails and there is no capability output
pub const UNPROCESSED_REPLY: &str = "Sorry, I couldn't process that.";

fn identity_query() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\b(what\s+is\s+your\s+name|what'?s\s+your\s+name|who\s+are\s+you)\b")
            .expect("identity pattern is valid")
    })
}

/// Whether the user is asking for the agent's name
pub fn is_identity_query(text: &str) -> bool {
    identity_query().is_match(text)
}

pub struct ConversationComposer {
    oracle: Arc<dyn LlmOracle>,
}

impl ConversationComposer {
    pub fn new(oracle: Arc<dyn LlmOracle>) -> Self {
        Self { oracle }
    }

    pub async fn compose(
        &self,
        command_output: &str,
        user_input: &str,
        persona: &AgentPersona,
        history: &str,
    ) -> String {
        if is_identity_query(user_input) {
            return format!("My name is {}.", persona.name);
        }

        let prompt = format!(
            "Conversation History:\n{}\n\
             User input: {}\n\
             Command output: {}\n\
             AI Name: {}\n\
             AI Behavior: {}\n\
             AI Personality: {}\n\
             Generate a final response to the user based on this information.",
            history,
            user_input,
            command_output,
            persona.name,
            persona.behavior,
            persona.personality
        );

        match self.oracle.complete(&prompt).await {
            Ok(reply) => reply.trim().to_string(),
            Err(e) => {
                tracing::warn!("Composition failed: {}", e);
                if command_output.trim().is_empty() {
                    UNPROCESSED_REPLY.to_string()
                } else {
                    command_output.trim().to_string()
                }
            }
        }
    }
}
