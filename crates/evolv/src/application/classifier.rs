//! Intent Classifier
//!
//! Routes a turn to conversation or to a capability. Cheap rules run
//! first; the oracle is only consulted when they all miss, and any oracle
//! failure means conversation.

use std::sync::Arc;

use crate::application::CapabilityRepository;
use crate::domain::{sanitize, CapabilityId, Intent};
use crate::ports::LlmOracle;

/// Real-time facts, checked before actions. Order matters.
pub const REAL_TIME_KEYWORDS: [&str; 4] = ["time", "date", "weather", "temperature"];

/// Action verbs. Order matters.
pub const ACTION_KEYWORDS: [&str; 7] = ["open", "launch", "start", "resume", "play", "stop", "pause"];

pub struct IntentClassifier {
    repository: Arc<CapabilityRepository>,
    oracle: Arc<dyn LlmOracle>,
}

impl IntentClassifier {
    pub fn new(repository: Arc<CapabilityRepository>, oracle: Arc<dyn LlmOracle>) -> Self {
        Self { repository, oracle }
    }

    pub async fn classify(&self, text: &str) -> Intent {
        // Priority 1: the user said a capability's name
        let candidate = sanitize(text);
        if !candidate.is_empty() {
            if let Some(capability) = self.repository.find_by_name(&candidate).await {
                tracing::debug!("Exact name match: {}", capability.id());
                return Intent::Command(capability.id().clone());
            }
        }

        // Priority 2: keyword tables
        if let Some(intent) = match_keywords(text) {
            tracing::debug!("Keyword match: {}", intent);
            return intent;
        }

        // Priority 3: ask the oracle
        match self.oracle.complete(&classification_prompt(text)).await {
            Ok(response) => {
                let intent = parse_decision(&response);
                tracing::debug!("Oracle classified '{}' as {}", text, intent);
                intent
            }
            Err(e) => {
                tracing::warn!("Classification failed, treating as conversation: {}", e);
                Intent::Conversation
            }
        }
    }
}

/// Keyword heuristics: first hit in table order wins.
///
/// Matching is by substring, so "update" hits `date`; the action object is
/// the lowercased text with every occurrence of the verb removed.
pub fn match_keywords(text: &str) -> Option<Intent> {
    let lower = text.to_lowercase();

    for keyword in REAL_TIME_KEYWORDS {
        if lower.contains(keyword) {
            return CapabilityId::new("utilities", &format!("tell_the_{}", keyword))
                .ok()
                .map(Intent::Command);
        }
    }

    for keyword in ACTION_KEYWORDS {
        if lower.contains(keyword) {
            let object = lower.replace(keyword, "");
            return CapabilityId::new("actions", &format!("{}_{}", keyword, object.trim()))
                .ok()
                .map(Intent::Command);
        }
    }

    None
}

/// Interpret the oracle's answer: `conversation` or `<category>: <name>`
pub fn parse_decision(response: &str) -> Intent {
    let result = response.trim().to_lowercase();
    if result == "conversation" {
        return Intent::Conversation;
    }

    match result.split_once(':') {
        Some((category, name)) => CapabilityId::new(category.trim(), name.trim())
            .map(Intent::Command)
            .unwrap_or(Intent::Conversation),
        None => Intent::Conversation,
    }
}

fn classification_prompt(text: &str) -> String {
    format!(
        "Analyze the following user input: '{}'\n\
         If this is a command request (e.g., for retrieving time, date, weather, opening applications, etc.), \
         respond with exactly one line of the form '<category>: <command_name>', both in lowercase with underscores \
         (e.g. 'utilities: tell_the_time' or 'actions: open_spotify').\n\
         If it is general conversation, respond with 'conversation'.",
        text
    )
}
