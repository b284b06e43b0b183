//! In-memory port implementations for unit tests.
//!
//! The fake runtime understands a tiny line dialect:
//! `def <name>` declares the function, `return <text>` yields output,
//! `fail <text>` raises, `sleep <ms>` delays.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{errors::DomainError, CapabilityId};
use crate::ports::{
    CapabilityRuntime, CapabilityStore, CredentialSink, HistorySink, Invocable, LlmOracle,
};

/// Oracle answering from a script, recording every prompt it sees
#[derive(Default)]
pub struct ScriptedOracle {
    replies: Mutex<VecDeque<Result<String, String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, text: &str) -> Self {
        self.replies.lock().unwrap().push_back(Ok(text.to_string()));
        self
    }

    pub fn fail(self, reason: &str) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(Err(reason.to_string()));
        self
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmOracle for ScriptedOracle {
    async fn complete(&self, prompt: &str) -> Result<String, DomainError> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(Ok(content)) => Ok(content),
            Some(Err(reason)) => Err(DomainError::Oracle(reason)),
            None => Err(DomainError::Oracle("no scripted reply left".to_string())),
        }
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_id(&self) -> &str {
        "scripted"
    }
}

/// Capability store backed by a map
#[derive(Default)]
pub struct MemoryStore {
    units: Mutex<BTreeMap<(String, String), String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_unit(self, category: &str, name: &str, source: &str) -> Self {
        self.units.lock().unwrap().insert(
            (category.to_string(), name.to_string()),
            source.to_string(),
        );
        self
    }

    pub fn len(&self) -> usize {
        self.units.lock().unwrap().len()
    }

    pub fn source(&self, category: &str, name: &str) -> Option<String> {
        self.units
            .lock()
            .unwrap()
            .get(&(category.to_string(), name.to_string()))
            .cloned()
    }
}

#[async_trait]
impl CapabilityStore for MemoryStore {
    async fn categories(&self) -> Result<Vec<String>, DomainError> {
        let mut categories: Vec<String> = self
            .units
            .lock()
            .unwrap()
            .keys()
            .map(|(category, _)| category.clone())
            .collect();
        categories.dedup();
        Ok(categories)
    }

    async fn units(&self, category: &str) -> Result<Vec<String>, DomainError> {
        Ok(self
            .units
            .lock()
            .unwrap()
            .keys()
            .filter(|(c, _)| c == category)
            .map(|(_, name)| name.clone())
            .collect())
    }

    async fn read(&self, id: &CapabilityId) -> Result<String, DomainError> {
        self.source(id.category(), id.name())
            .ok_or_else(|| DomainError::not_found(id))
    }

    async fn exists(&self, id: &CapabilityId) -> Result<bool, DomainError> {
        Ok(self.source(id.category(), id.name()).is_some())
    }

    async fn create(&self, id: &CapabilityId, source: &str) -> Result<bool, DomainError> {
        let mut units = self.units.lock().unwrap();
        let key = (id.category().to_string(), id.name().to_string());
        if units.contains_key(&key) {
            return Ok(false);
        }
        units.insert(key, source.to_string());
        Ok(true)
    }
}

/// Runtime for the line dialect described in the module docs
pub struct LineRuntime;

struct LineUnit {
    lines: Vec<String>,
}

#[async_trait]
impl Invocable for LineUnit {
    async fn invoke(&self, args: &[String]) -> Result<String, DomainError> {
        let mut output = String::new();
        for line in &self.lines {
            if let Some(ms) = line.strip_prefix("sleep ") {
                let ms: u64 = ms.trim().parse().unwrap_or(0);
                tokio::time::sleep(Duration::from_millis(ms)).await;
            } else if let Some(reason) = line.strip_prefix("fail ") {
                return Err(DomainError::Execution(reason.to_string()));
            } else if let Some(text) = line.strip_prefix("return ") {
                output = text.replace("$@", &args.join(" "));
            }
        }
        Ok(output)
    }
}

#[async_trait]
impl CapabilityRuntime for LineRuntime {
    fn language(&self) -> &str {
        "line script"
    }

    fn extension(&self) -> &str {
        "line"
    }

    fn defines_function(&self, source: &str, name: &str) -> bool {
        source.lines().any(|l| l.trim() == format!("def {}", name))
    }

    async fn bind(
        &self,
        id: &CapabilityId,
        source: &str,
    ) -> Result<Arc<dyn Invocable>, DomainError> {
        if !self.defines_function(source, id.name()) {
            return Err(DomainError::load(id, "function not defined"));
        }
        Ok(Arc::new(LineUnit {
            lines: source.lines().map(|l| l.trim().to_string()).collect(),
        }))
    }

    fn builtin_source(&self, name: &str) -> Option<String> {
        match name {
            "tell_the_time" => Some("def tell_the_time\nreturn 2026-01-01 12:00:00".to_string()),
            _ => None,
        }
    }

    fn stub_source(&self, name: &str) -> String {
        format!("def {}\nreturn Fallback: Command not implemented.", name)
    }
}

/// History sink backed by a vector
#[derive(Default)]
pub struct MemoryHistory {
    lines: Mutex<Vec<String>>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

#[async_trait]
impl HistorySink for MemoryHistory {
    async fn append(&self, line: &str) -> Result<(), DomainError> {
        self.lines.lock().unwrap().push(line.to_string());
        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<String>, DomainError> {
        Ok(self.lines())
    }
}

/// Credential registry backed by a map
#[derive(Default)]
pub struct MemoryCredentials {
    notes: Mutex<BTreeMap<String, String>>,
}

impl MemoryCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notes(&self) -> BTreeMap<String, String> {
        self.notes.lock().unwrap().clone()
    }
}

#[async_trait]
impl CredentialSink for MemoryCredentials {
    async fn record(&self, name: &str, note: &str) -> Result<(), DomainError> {
        self.notes
            .lock()
            .unwrap()
            .entry(name.to_string())
            .or_insert_with(|| note.to_string());
        Ok(())
    }
}
