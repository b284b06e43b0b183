//! Orchestrator - one `evolve` cycle per user turn
//!
//! Start → Classify → Conversation → Compose
//!                  → Command → Lookup (→ Synthesize) → Execute → Compose
//! → record in history → reply.
//!
//! Every path returns a string; no error escapes a turn.

use std::sync::Arc;
use std::time::Duration;

use crate::application::{
    CapabilityExecutor, CapabilityRepository, CapabilitySynthesizer, ConversationComposer,
    HistoryStore, IntentClassifier, LoadReport, DEFAULT_HISTORY_WINDOW, DEFAULT_SLOW_THRESHOLD,
};
use crate::domain::{
    errors::DomainError, AgentPersona, CapabilityId, HistoryRecord, Intent, Turn,
    DEFAULT_SIMILARITY_THRESHOLD,
};
use crate::ports::{CapabilityRuntime, CapabilityStore, CredentialSink, HistorySink, LlmOracle};

/// Reply for empty or whitespace-only input
pub const EMPTY_INPUT_REPLY: &str = "I didn't catch that. Please try again.";

/// Collaborators the orchestrator is wired with
#[derive(Clone)]
pub struct AgentPorts {
    pub oracle: Arc<dyn LlmOracle>,
    pub store: Arc<dyn CapabilityStore>,
    pub runtime: Arc<dyn CapabilityRuntime>,
    pub history: Arc<dyn HistorySink>,
    pub credentials: Arc<dyn CredentialSink>,
}

/// Tunables of the pipeline
#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub persona: AgentPersona,
    pub similarity_threshold: f32,
    pub history_window: usize,
    pub slow_threshold: Duration,
    /// Hard deadline per capability invocation; none by default
    pub timeout: Option<Duration>,
    pub os_hint: Option<String>,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            persona: AgentPersona::default(),
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            history_window: DEFAULT_HISTORY_WINDOW,
            slow_threshold: DEFAULT_SLOW_THRESHOLD,
            timeout: None,
            os_hint: None,
        }
    }
}

pub struct Orchestrator {
    persona: AgentPersona,
    history_window: usize,
    repository: Arc<CapabilityRepository>,
    history: HistoryStore,
    classifier: IntentClassifier,
    synthesizer: CapabilitySynthesizer,
    executor: CapabilityExecutor,
    composer: ConversationComposer,
}

impl Orchestrator {
    pub fn new(ports: AgentPorts, settings: AgentSettings) -> Self {
        let repository = Arc::new(
            CapabilityRepository::new(ports.store, ports.runtime)
                .with_similarity_threshold(settings.similarity_threshold),
        );

        let mut synthesizer = CapabilitySynthesizer::new(
            repository.clone(),
            ports.oracle.clone(),
            ports.credentials,
        );
        if let Some(os_hint) = settings.os_hint {
            synthesizer = synthesizer.with_os_hint(os_hint);
        }

        Self {
            persona: settings.persona,
            history_window: settings.history_window,
            history: HistoryStore::new(ports.history),
            classifier: IntentClassifier::new(repository.clone(), ports.oracle.clone()),
            synthesizer,
            executor: CapabilityExecutor::new(repository.clone())
                .with_slow_threshold(settings.slow_threshold)
                .with_timeout(settings.timeout),
            composer: ConversationComposer::new(ports.oracle),
            repository,
        }
    }

    /// Load persisted capabilities; call once before the first turn
    pub async fn load(&self) -> Result<LoadReport, DomainError> {
        let report = self.repository.load().await?;
        tracing::info!(
            "Loaded {} capabilities ({} skipped)",
            report.loaded,
            report.skipped.len()
        );
        Ok(report)
    }

    pub fn persona(&self) -> &AgentPersona {
        &self.persona
    }

    pub fn repository(&self) -> &Arc<CapabilityRepository> {
        &self.repository
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Process one user turn and return the reply
    pub async fn evolve(&self, user_input: &str) -> String {
        if user_input.trim().is_empty() {
            tracing::info!("No input given. Evolution cancelled.");
            self.history
                .record(HistoryRecord::notice("No input given. Evolution cancelled."))
                .await;
            return EMPTY_INPUT_REPLY.to_string();
        }

        self.history
            .record(HistoryRecord::Turn(Turn::user(user_input)))
            .await;

        let intent = self.classifier.classify(user_input).await;
        tracing::debug!("Intent: {}", intent);

        let command_output = match intent {
            Intent::Conversation => String::new(),
            Intent::Command(id) => self.run_command(&id, user_input).await,
        };

        let projection = self.history.projection(self.history_window).await;
        let reply = self
            .composer
            .compose(&command_output, user_input, &self.persona, &projection)
            .await;

        self.history
            .record(HistoryRecord::Turn(Turn::agent(reply.as_str())))
            .await;
        reply
    }

    async fn run_command(&self, id: &CapabilityId, user_input: &str) -> String {
        let mut target = id.clone();

        if self.repository.lookup(id).await.is_none() {
            match self.synthesizer.synthesize(id, user_input).await {
                Ok(synthesis) => {
                    if synthesis.created() {
                        self.history.record(HistoryRecord::created(id.clone())).await;
                    }
                    target = synthesis.capability.id().clone();
                }
                Err(e) => {
                    tracing::warn!("Synthesis of {} failed: {}", id, e);
                }
            }
        }

        self.executor.execute(&target, &[]).await
    }
}
