//! Gemini `generateContent` oracle.
//!
//! The API key travels in the `x-goog-api-key` header, never in the URL.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use evolv::{DomainError, LlmOracle};

pub const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

const API_KEY_HEADER: &str = "x-goog-api-key";

pub struct GeminiOracle {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiOracle {
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
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
            api_key: api_key.into(),
            model: model.into(),
        })
    }
}

// ============================================
// Request/Response Types
// ============================================

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

fn endpoint(base_url: &str, model: &str) -> String {
    format!("{}/{}:generateContent", base_url, model)
}

fn build_request(prompt: &str) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content {
            role: Some("user".to_string()),
            parts: vec![Part {
                text: prompt.to_string(),
            }],
        }],
    }
}

fn reply_text(response: GenerateContentResponse) -> Result<String, DomainError> {
    response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| DomainError::Oracle("Gemini returned no candidates".to_string()))?
        .content
        .map(|c| c.parts.into_iter().map(|p| p.text).collect::<String>())
        .filter(|text| !text.is_empty())
        .ok_or_else(|| DomainError::Oracle("Gemini candidate had no text".to_string()))
}

#[async_trait]
impl LlmOracle for GeminiOracle {
    async fn complete(&self, prompt: &str) -> Result<String, DomainError> {
        let response = self
            .client
            .post(endpoint(&self.base_url, &self.model))
            .header(API_KEY_HEADER, &self.api_key)
            .json(&build_request(prompt))
            .send()
            .await
            .map_err(|e| DomainError::Oracle(format!("Request failed: {}", e.without_url())))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            return Err(DomainError::Oracle(format!("{}: {}", status, body)));
        }

        let payload: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| DomainError::Oracle(format!("Parse error: {}", e.without_url())))?;

        reply_text(payload)
    }

    fn provider_name(&self) -> &str {
        "gemini"
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}
