//! Evolv Core Library
//!
//! A conversational agent that grows its own capabilities: each turn is
//! classified as conversation or as a request for a capability, missing
//! capabilities are synthesized by a language model, and the result is
//! folded back into a natural-language reply.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain/`): Pure business entities and logic
//!   - `entities/`: Capability, Intent, Turn / HistoryRecord
//!   - `value_objects/`: CapabilityId (+ `sanitize`), AgentPersona
//!   - `services/`: similarity scoring, code extraction
//!   - `errors/`: Domain-specific error types
//!
//! - **Ports** (`ports/`): Abstract interfaces (traits)
//!   - `repositories/`: capability store, history sink, credential sink
//!   - `services/`: language-model oracle, capability runtime
//!
//! - **Application** (`application/`): the turn pipeline
//!
//! # Usage
//!
//! ```rust,ignore
//! use evolv::{AgentPorts, AgentSettings, Orchestrator};
//!
//! let agent = Orchestrator::new(ports, AgentSettings::default());
//! agent.load().await?;
//! let reply = agent.evolve("what time is it").await;
//! ```

pub mod application;
pub mod domain;
pub mod ports;

// Re-export commonly used types
pub use application::{
    AgentPorts, AgentSettings, CapabilityExecutor, CapabilityRepository, CapabilitySynthesizer,
    ConversationComposer, HistoryStore, IntentClassifier, LoadReport, Orchestrator, Synthesis,
    SynthesisOrigin, EMPTY_INPUT_REPLY,
};
pub use domain::{
    sanitize, similarity, AgentPersona, Capability, CapabilityId, DomainError, HistoryRecord,
    Intent, Role, Turn,
};
pub use ports::{
    CapabilityRuntime, CapabilityStore, CredentialSink, HistorySink, Invocable, LlmOracle,
};
