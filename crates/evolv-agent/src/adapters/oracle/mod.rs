//! HTTP language-model oracles

mod gemini;
mod openai;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use evolv::LlmOracle;

use crate::config::OracleConfig;

pub use gemini::GeminiOracle;
pub use openai::OpenAiOracle;

/// Oracle provider
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    OpenAI,
    Gemini,
}

impl Provider {
    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::OpenAI => openai::DEFAULT_MODEL,
            Provider::Gemini => gemini::DEFAULT_MODEL,
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Provider::OpenAI => openai::DEFAULT_BASE_URL,
            Provider::Gemini => gemini::BASE_URL,
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::OpenAI => write!(f, "openai"),
            Provider::Gemini => write!(f, "gemini"),
        }
    }
}

impl std::str::FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAI),
            "gemini" | "google" => Ok(Provider::Gemini),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

/// Build the configured oracle
pub fn build_oracle(config: &OracleConfig) -> Result<Arc<dyn LlmOracle>> {
    let timeout = Duration::from_secs(config.request_timeout_secs);
    let base_url = config
        .base_url
        .as_deref()
        .unwrap_or_else(|| config.provider.default_base_url());
    let model = config
        .model
        .clone()
        .unwrap_or_else(|| config.provider.default_model().to_string());

    let oracle: Arc<dyn LlmOracle> = match config.provider {
        Provider::OpenAI => {
            if config.api_key.is_none() {
                tracing::warn!("No API key configured; sending unauthenticated requests to {}", base_url);
            }
            Arc::new(OpenAiOracle::new(base_url, config.api_key.clone(), model, timeout)?)
        }
        Provider::Gemini => {
            let api_key = config
                .api_key
                .clone()
                .context("Gemini requires an API key (set EVOLV_API_KEY or [oracle].api_key)")?;
            Arc::new(GeminiOracle::new(base_url, api_key, model, timeout)?)
        }
    };

    tracing::info!(
        "🔮 Oracle ready: {} ({})",
        oracle.provider_name(),
        oracle.model_id()
    );
    Ok(oracle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_parsing() {
        assert_eq!("OpenAI".parse::<Provider>(), Ok(Provider::OpenAI));
        assert_eq!("gemini".parse::<Provider>(), Ok(Provider::Gemini));
        assert!("anthropic".parse::<Provider>().is_err());
        assert_eq!(Provider::Gemini.to_string(), "gemini");
    }

    #[test]
    fn test_gemini_without_key_is_rejected() {
        let config = OracleConfig {
            provider: Provider::Gemini,
            api_key: None,
            ..OracleConfig::default()
        };

        assert!(build_oracle(&config).is_err());
    }

    #[test]
    fn test_defaults_fill_in_model() {
        let oracle = build_oracle(&OracleConfig::default()).unwrap();

        assert_eq!(oracle.provider_name(), "openai");
        assert_eq!(oracle.model_id(), openai::DEFAULT_MODEL);
    }
}
