//! OpenAI-compatible chat completion oracle (`POST {base}/chat/completions`).
//!
//! Works with any server speaking the same protocol (OpenAI, local proxies).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use evolv::{DomainError, LlmOracle};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

const TEMPERATURE: f32 = 0.7;

pub struct OpenAiOracle {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAiOracle {
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, DomainError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::Oracle(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model: model.into(),
        })
    }
}

// ============================================
// Request/Response Types
// ============================================

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [WireMessage<'a>; 1],
    temperature: f32,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

fn build_request<'a>(model: &'a str, prompt: &'a str) -> ChatRequest<'a> {
    ChatRequest {
        model,
        messages: [WireMessage {
            role: "user",
            content: prompt,
        }],
        temperature: TEMPERATURE,
    }
}

fn reply_text(response: ChatResponse) -> Result<String, DomainError> {
    response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| DomainError::Oracle("response contained no choices".to_string()))?
        .message
        .content
        .ok_or_else(|| DomainError::Oracle("response choice had no content".to_string()))
}

#[async_trait]
impl LlmOracle for OpenAiOracle {
    async fn complete(&self, prompt: &str) -> Result<String, DomainError> {
        let url = format!("{}/chat/completions", self.base_url);
        let mut request = self
            .client
            .post(&url)
            .json(&build_request(&self.model, prompt));
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| DomainError::Oracle(format!("Request failed: {}", e.without_url())))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DomainError::Oracle(format!("{}: {}", status, body)));
        }

        let payload: ChatResponse = response
            .json()
            .await
            .map_err(|e| DomainError::Oracle(format!("Parse error: {}", e.without_url())))?;

        reply_text(payload)
    }

    fn provider_name(&self) -> &str {
        "openai"
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}
