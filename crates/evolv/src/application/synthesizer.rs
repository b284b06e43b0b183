//! Capability Synthesizer
//!
//! Creates a capability when none matches an intent:
//! 1. Ask the oracle for source and extract the function from its reply
//! 2. Validate it by binding it with the runtime
//! 3. Fall back to a built-in source, or a stub, when 1-2 fail
//! 4. Reuse a sufficiently similar capability instead of writing
//! 5. Persist, reload and note any API credential requirement
//!
//! Once `synthesize` returns `Ok`, a lookup of the identity succeeds.

use std::sync::{Arc, OnceLock};

use regex::Regex;

use crate::application::CapabilityRepository;
use crate::domain::{errors::DomainError, extract_code, Capability, CapabilityId};
use crate::ports::{CredentialSink, LlmOracle};

/// Where the returned capability came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthesisOrigin {
    /// The identity was already taken; nothing generated
    AlreadyPresent,
    /// A similar capability was reused; nothing written
    Reused,
    /// Generated by the oracle and persisted
    Generated,
    /// Oracle unavailable; a built-in default was persisted
    Builtin,
    /// Oracle unavailable, no built-in; a "not implemented" stub was persisted
    Stub,
}

#[derive(Debug, Clone)]
pub struct Synthesis {
    pub capability: Arc<Capability>,
    pub origin: SynthesisOrigin,
}

impl Synthesis {
    /// Whether a new unit was written
    pub fn created(&self) -> bool {
        matches!(
            self.origin,
            SynthesisOrigin::Generated | SynthesisOrigin::Builtin | SynthesisOrigin::Stub
        )
    }
}

/// "<os> (<arch>)" of the host, e.g. "linux (x86_64)"
pub fn host_os_hint() -> String {
    format!("{} ({})", std::env::consts::OS, std::env::consts::ARCH)
}

fn credential_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)api[_\s-]?key|access[_\s-]?token|client[_\s-]?secret|bearer\s")
            .expect("credential pattern is valid")
    })
}

/// Whether generated source mentions an API credential
pub fn needs_credentials(source: &str) -> bool {
    credential_pattern().is_match(source)
}

pub struct CapabilitySynthesizer {
    repository: Arc<CapabilityRepository>,
    oracle: Arc<dyn LlmOracle>,
    credentials: Arc<dyn CredentialSink>,
    os_hint: String,
}

impl CapabilitySynthesizer {
    pub fn new(
        repository: Arc<CapabilityRepository>,
        oracle: Arc<dyn LlmOracle>,
        credentials: Arc<dyn CredentialSink>,
    ) -> Self {
        Self {
            repository,
            oracle,
            credentials,
            os_hint: host_os_hint(),
        }
    }

    pub fn with_os_hint(mut self, os_hint: impl Into<String>) -> Self {
        self.os_hint = os_hint.into();
        self
    }

    pub async fn synthesize(
        &self,
        id: &CapabilityId,
        user_input: &str,
    ) -> Result<Synthesis, DomainError> {
        if let Some(capability) = self.repository.lookup(id).await {
            return Ok(Synthesis {
                capability,
                origin: SynthesisOrigin::AlreadyPresent,
            });
        }
        if self.repository.exists(id).await? {
            tracing::info!(
                "Command '{}' already exists in category '{}'. Using existing command.",
                id.name(),
                id.category()
            );
            self.repository.load().await?;
            let capability = self.repository.lookup(id).await.ok_or_else(|| {
                DomainError::load(id, "existing unit could not be bound")
            })?;
            return Ok(Synthesis {
                capability,
                origin: SynthesisOrigin::AlreadyPresent,
            });
        }

        let (source, origin) = match self.generate(id, user_input).await {
            Ok(source) => (source, SynthesisOrigin::Generated),
            Err(e) => {
                tracing::warn!("Failed to create command '{}': {}", id.name(), e);
                self.fallback(id)
            }
        };

        // the oracle round-trip is already paid for, but a near-duplicate
        // must still not be written
        if let Some(existing) = self.repository.find_similar(id, user_input).await {
            tracing::info!(
                "Reusing '{}' instead of creating '{}'",
                existing.id(),
                id
            );
            return Ok(Synthesis {
                capability: existing,
                origin: SynthesisOrigin::Reused,
            });
        }

        let inserted = self.repository.insert(id, &source).await?;
        if !inserted.created {
            return Ok(Synthesis {
                capability: inserted.capability,
                origin: SynthesisOrigin::AlreadyPresent,
            });
        }

        match origin {
            SynthesisOrigin::Generated => tracing::info!(
                "✨ Command '{}' has been created in category '{}'.",
                id.name(),
                id.category()
            ),
            _ => tracing::info!(
                "Fallback: Command '{}' has been created in category '{}'.",
                id.name(),
                id.category()
            ),
        }

        if needs_credentials(&source) {
            let note = format!(
                "Command '{}' in category '{}' calls an external API. \
                 Set its API key variable at the top of the command source.",
                id.name(),
                id.category()
            );
            if let Err(e) = self.credentials.record(id.name(), &note).await {
                tracing::warn!("Failed to record credential note for {}: {}", id, e);
            }
        }

        Ok(Synthesis {
            capability: inserted.capability,
            origin,
        })
    }

    /// Ask the oracle for a unit and make sure it binds
    async fn generate(&self, id: &CapabilityId, user_input: &str) -> Result<String, DomainError> {
        let runtime = self.repository.runtime();
        let response = self
            .oracle
            .complete(&self.generation_prompt(id, user_input))
            .await?;

        let source = extract_code(&response, |body| {
            runtime.defines_function(body, id.name())
        });
        runtime.bind(id, &source).await?;
        Ok(source)
    }

    fn fallback(&self, id: &CapabilityId) -> (String, SynthesisOrigin) {
        let runtime = self.repository.runtime();
        match runtime.builtin_source(id.name()) {
            Some(source) => (source, SynthesisOrigin::Builtin),
            None => (runtime.stub_source(id.name()), SynthesisOrigin::Stub),
        }
    }

    fn generation_prompt(&self, id: &CapabilityId, user_input: &str) -> String {
        let language = self.repository.runtime().language();
        format!(
            "Create a {language} function named '{name}' based on the following request: '{input}'.\n\
             The current operating system is '{os}'. Prefer mechanisms native to this OS and only fall back \
             to a network API when nothing local can answer.\n\
             Requirements:\n\
             - Define exactly one function named '{name}'; it must produce its result as a string.\n\
             - Put configurable values such as API keys and endpoints in clearly named variables at the top \
             of the source, never inline.\n\
             - Do not hardcode file paths; derive directories at runtime.\n\
             - Handle errors inside the function and report them in the returned text instead of failing.\n\
             - When launching an application, detach it from the function (in shell: `app >/dev/null 2>&1 &`) \
             and return a confirmation right away.\n\
             Examples: to tell the time, return the current time; to open an application, launch it with the \
             appropriate system command.\n\
             Do not include any explanations; only return the valid code.",
            language = language,
            name = id.name(),
            input = user_input,
            os = self.os_hint,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{LineRuntime, MemoryCredentials, MemoryStore, ScriptedOracle};

    struct Fixture {
        store: Arc<MemoryStore>,
        repository: Arc<CapabilityRepository>,
        credentials: Arc<MemoryCredentials>,
        oracle: Arc<ScriptedOracle>,
        synthesizer: CapabilitySynthesizer,
    }

    async fn fixture(store: MemoryStore, oracle: ScriptedOracle) -> Fixture {
        let store = Arc::new(store);
        let repository = Arc::new(CapabilityRepository::new(
            store.clone(),
            Arc::new(LineRuntime),
        ));
        repository.load().await.unwrap();
        let credentials = Arc::new(MemoryCredentials::new());
        let oracle = Arc::new(oracle);
        let synthesizer =
            CapabilitySynthesizer::new(repository.clone(), oracle.clone(), credentials.clone())
                .with_os_hint("testos");
        Fixture {
            store,
            repository,
            credentials,
            oracle,
            synthesizer,
        }
    }

    fn id(category: &str, name: &str) -> CapabilityId {
        CapabilityId::new(category, name).unwrap()
    }

    #[tokio::test]
    async fn test_generated_unit_is_extracted_and_persisted() {
        let f = fixture(
            MemoryStore::new(),
            ScriptedOracle::new().reply("Sure!\n```line\ndef roll_dice\nreturn 4\n```\nEnjoy."),
        )
        .await;
        let target = id("games", "roll_dice");

        let synthesis = f.synthesizer.synthesize(&target, "roll a dice").await.unwrap();

        assert_eq!(synthesis.origin, SynthesisOrigin::Generated);
        assert!(synthesis.created());
        assert_eq!(
            f.store.source("games", "roll_dice").unwrap(),
            "def roll_dice\nreturn 4\n"
        );
        let found = f.repository.lookup(&target).await.unwrap();
        assert_eq!(found.invoke(&[]).await.unwrap(), "4");
    }

    #[tokio::test]
    async fn test_prompt_names_function_and_os() {
        let f = fixture(
            MemoryStore::new(),
            ScriptedOracle::new().reply("def roll_dice\nreturn 4"),
        )
        .await;

        f.synthesizer
            .synthesize(&id("games", "roll_dice"), "roll a dice")
            .await
            .unwrap();

        let prompt = &f.oracle.prompts()[0];
        assert!(prompt.contains("line script function named 'roll_dice'"));
        assert!(prompt.contains("'testos'"));
        assert!(prompt.contains("roll a dice"));
        assert!(prompt.contains(">/dev/null 2>&1 &"));
    }

    #[tokio::test]
    async fn test_oracle_failure_uses_builtin() {
        let f = fixture(MemoryStore::new(), ScriptedOracle::new().fail("offline")).await;
        let target = id("utilities", "tell_the_time");

        let synthesis = f.synthesizer.synthesize(&target, "what time is it").await.unwrap();

        assert_eq!(synthesis.origin, SynthesisOrigin::Builtin);
        assert!(f.repository.lookup(&target).await.is_some());
    }

    #[tokio::test]
    async fn test_total_failure_persists_stub() {
        let f = fixture(MemoryStore::new(), ScriptedOracle::new().fail("offline")).await;
        let target = id("actions", "open_portal");

        let synthesis = f.synthesizer.synthesize(&target, "open portal").await.unwrap();

        assert_eq!(synthesis.origin, SynthesisOrigin::Stub);
        let found = f.repository.lookup(&target).await.unwrap();
        assert_eq!(
            found.invoke(&[]).await.unwrap(),
            "Fallback: Command not implemented."
        );
    }

    #[tokio::test]
    async fn test_unbindable_generation_falls_back() {
        let f = fixture(
            MemoryStore::new(),
            ScriptedOracle::new().reply("```\nreturn forgot the definition\n```"),
        )
        .await;
        let target = id("actions", "open_portal");

        let synthesis = f.synthesizer.synthesize(&target, "open portal").await.unwrap();

        assert_eq!(synthesis.origin, SynthesisOrigin::Stub);
        assert!(f.repository.lookup(&target).await.is_some());
    }

    #[tokio::test]
    async fn test_similar_capability_is_reused_without_write() {
        let f = fixture(
            MemoryStore::new().with_unit(
                "utilities",
                "tell_the_weather",
                "def tell_the_weather\nreturn sunny",
            ),
            ScriptedOracle::new().reply("def tell_the_weathers\nreturn rainy"),
        )
        .await;

        let synthesis = f
            .synthesizer
            .synthesize(&id("utilities", "tell_the_weathers"), "weathers?")
            .await
            .unwrap();

        assert_eq!(synthesis.origin, SynthesisOrigin::Reused);
        assert!(!synthesis.created());
        assert_eq!(synthesis.capability.id().name(), "tell_the_weather");
        assert_eq!(f.store.len(), 1);
        // the oracle was still consulted before dedup
        assert_eq!(f.oracle.calls(), 1);
    }

    #[tokio::test]
    async fn test_back_to_back_requests_create_one_unit() {
        let f = fixture(
            MemoryStore::new(),
            ScriptedOracle::new()
                .reply("def tell_the_weather\nreturn sunny")
                .reply("def tell_the_weathers\nreturn rainy"),
        )
        .await;

        let first = f
            .synthesizer
            .synthesize(&id("utilities", "tell_the_weather"), "tell me the weather")
            .await
            .unwrap();
        let second = f
            .synthesizer
            .synthesize(&id("utilities", "tell_the_weathers"), "tell me the weathers")
            .await
            .unwrap();

        assert_eq!(first.origin, SynthesisOrigin::Generated);
        assert!(first.created());
        assert_eq!(second.origin, SynthesisOrigin::Reused);
        assert!(!second.created());
        assert_eq!(second.capability.id().name(), "tell_the_weather");
        assert_eq!(f.store.len(), 1);
        assert_eq!(f.repository.list().await.len(), 1);
    }

    #[tokio::test]
    async fn test_existing_identity_skips_generation() {
        let f = fixture(
            MemoryStore::new().with_unit("games", "roll_dice", "def roll_dice\nreturn 6"),
            ScriptedOracle::new(),
        )
        .await;

        let synthesis = f
            .synthesizer
            .synthesize(&id("games", "roll_dice"), "roll")
            .await
            .unwrap();

        assert_eq!(synthesis.origin, SynthesisOrigin::AlreadyPresent);
        assert_eq!(f.oracle.calls(), 0);
    }

    #[tokio::test]
    async fn test_credential_mention_is_recorded() {
        let f = fixture(
            MemoryStore::new(),
            ScriptedOracle::new().reply("API_KEY=changeme\ndef stock_price\nreturn 42"),
        )
        .await;

        f.synthesizer
            .synthesize(&id("finance", "stock_price"), "price of ACME")
            .await
            .unwrap();

        let notes = f.credentials.notes();
        assert!(notes["stock_price"].contains("stock_price"));
    }

    #[tokio::test]
    async fn test_no_credential_note_for_plain_units() {
        let f = fixture(
            MemoryStore::new(),
            ScriptedOracle::new().reply("def roll_dice\nreturn 4"),
        )
        .await;

        f.synthesizer
            .synthesize(&id("games", "roll_dice"), "roll a dice")
            .await
            .unwrap();

        assert!(f.credentials.notes().is_empty());
    }

    #[test]
    fn test_needs_credentials() {
        assert!(needs_credentials("WEATHER_API_KEY=\"\""));
        assert!(needs_credentials("# set your api key here"));
        assert!(needs_credentials("Authorization: Bearer $TOKEN"));
        assert!(!needs_credentials("date '+%H:%M'"));
    }
}
