//! Configuration management for the Evolv agent
//!
//! Persona, oracle, runtime and storage settings live in
//! ~/.config/evolv/config.toml (platform config dir). The file is written
//! with defaults on first start; `EVOLV_*` environment variables override it.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use evolv::application::{DEFAULT_HISTORY_WINDOW, DEFAULT_SLOW_THRESHOLD};
use evolv::domain::DEFAULT_SIMILARITY_THRESHOLD;
use evolv::{AgentPersona, AgentSettings};

use crate::adapters::shell_runtime::DEFAULT_INTERPRETER;
use crate::adapters::Provider;

const CONFIG_DIR: &str = "evolv";
const CONFIG_FILE: &str = "config.toml";

pub const ENV_API_KEY: &str = "EVOLV_API_KEY";
pub const ENV_MODEL: &str = "EVOLV_MODEL";
pub const ENV_BASE_URL: &str = "EVOLV_BASE_URL";
pub const ENV_PROVIDER: &str = "EVOLV_PROVIDER";

/// Language-model oracle settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    #[serde(default)]
    pub provider: Provider,
    /// Provider default when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Provider default when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    60
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            base_url: None,
            model: None,
            api_key: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Capability runtime settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default = "default_interpreter")]
    pub interpreter: String,
    #[serde(default = "default_slow_threshold_secs")]
    pub slow_threshold_secs: u64,
    /// Kill a command after this long; 0 (the default) never kills
    #[serde(default)]
    pub timeout_secs: u64,
}

fn default_interpreter() -> String {
    DEFAULT_INTERPRETER.to_string()
}

fn default_slow_threshold_secs() -> u64 {
    DEFAULT_SLOW_THRESHOLD.as_secs()
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            interpreter: default_interpreter(),
            slow_threshold_secs: default_slow_threshold_secs(),
            timeout_secs: 0,
        }
    }
}

/// On-disk locations; unset entries resolve under the platform data dir
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capabilities_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials_file: Option<PathBuf>,
}

impl StorageConfig {
    pub fn capabilities_dir(&self) -> Result<PathBuf> {
        resolve(&self.capabilities_dir, "commands")
    }

    pub fn history_file(&self) -> Result<PathBuf> {
        resolve(&self.history_file, "history.log")
    }

    pub fn credentials_file(&self) -> Result<PathBuf> {
        resolve(&self.credentials_file, "api_credentials.json")
    }
}

fn resolve(configured: &Option<PathBuf>, default_name: &str) -> Result<PathBuf> {
    match configured {
        Some(path) => Ok(path.clone()),
        None => Ok(Config::data_dir()?.join(default_name)),
    }
}

/// Pipeline tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,
    #[serde(default = "default_history_window")]
    pub history_window: usize,
}

fn default_similarity_threshold() -> f32 {
    DEFAULT_SIMILARITY_THRESHOLD
}

fn default_history_window() -> usize {
    DEFAULT_HISTORY_WINDOW
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
            history_window: default_history_window(),
        }
    }
}

/// Agent Configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub persona: AgentPersona,
    #[serde(default)]
    pub oracle: OracleConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub agent: AgentConfig,
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join(CONFIG_DIR);
        Ok(config_dir)
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE))
    }

    /// Get the data directory (capabilities, history, credentials)
    pub fn data_dir() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .context("Could not determine data directory")?
            .join(CONFIG_DIR);
        Ok(data_dir)
    }

    /// Load config from `path` (default location when `None`), writing the
    /// defaults there first if the file does not exist.
    pub fn load_or_init(path: Option<&Path>) -> Result<(Self, PathBuf)> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        if !path.exists() {
            let config = Self::default();
            config.save_to(&path)?;
            tracing::info!("📝 Wrote default configuration to {:?}", path);
            return Ok((config, path));
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;

        Ok((config, path))
    }

    /// Save config to file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config directory {:?}", dir))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content).with_context(|| format!("Failed to write config to {:?}", path))?;

        Ok(())
    }

    /// Apply overrides from a variable lookup; empty values are ignored
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(provider) = get(ENV_PROVIDER) {
            self.oracle.provider = provider
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))
                .with_context(|| format!("Invalid {}", ENV_PROVIDER))?;
        }
        if let Some(api_key) = get(ENV_API_KEY) {
            self.oracle.api_key = Some(api_key);
        }
        if let Some(model) = get(ENV_MODEL) {
            self.oracle.model = Some(model);
        }
        if let Some(base_url) = get(ENV_BASE_URL) {
            self.oracle.base_url = Some(base_url);
        }
        Ok(())
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    pub fn agent_settings(&self) -> AgentSettings {
        AgentSettings {
            persona: self.persona.clone(),
            similarity_threshold: self.agent.similarity_threshold,
            history_window: self.agent.history_window,
            slow_threshold: Duration::from_secs(self.runtime.slow_threshold_secs),
            timeout: (self.runtime.timeout_secs > 0)
                .then(|| Duration::from_secs(self.runtime.timeout_secs)),
            os_hint: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_first_load_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("evolv").join("config.toml");

        let (config, written) = Config::load_or_init(Some(&path)).unwrap();

        assert_eq!(written, path);
        assert!(path.exists());
        assert_eq!(config.persona.name, "Assistant");
        assert_eq!(config.oracle.provider, Provider::OpenAI);
        assert_eq!(config.runtime.interpreter, "sh");
        assert_eq!(config.runtime.slow_threshold_secs, 10);
        assert_eq!(config.runtime.timeout_secs, 0);

        let (reloaded, _) = Config::load_or_init(Some(&path)).unwrap();
        assert_eq!(reloaded.persona, config.persona);
        assert_eq!(reloaded.agent.history_window, 10);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[persona]\nname = \"Jarvis\"\n\n[oracle]\nprovider = \"gemini\"\n\n[agent]\nsimilarity_threshold = 0.8\n",
        )
        .unwrap();

        let (config, _) = Config::load_or_init(Some(&path)).unwrap();

        assert_eq!(config.persona.name, "Jarvis");
        assert_eq!(config.persona.behavior, "helpful and friendly");
        assert_eq!(config.oracle.provider, Provider::Gemini);
        assert_eq!(config.oracle.request_timeout_secs, 60);
        assert!((config.agent.similarity_threshold - 0.8).abs() < f32::EPSILON);
        assert_eq!(config.agent.history_window, 10);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[persona\nname = ").unwrap();

        assert!(Config::load_or_init(Some(&path)).is_err());
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            (ENV_PROVIDER, "gemini"),
            (ENV_API_KEY, "secret"),
            (ENV_MODEL, ""),
        ]
        .into_iter()
        .collect();
        let mut config = Config::default();
        config.oracle.model = Some("configured".to_string());

        config
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.oracle.provider, Provider::Gemini);
        assert_eq!(config.oracle.api_key.as_deref(), Some("secret"));
        assert_eq!(config.oracle.model.as_deref(), Some("configured"));
        assert!(config.oracle.base_url.is_none());
    }

    #[test]
    fn test_unknown_provider_override_fails() {
        let mut config = Config::default();

        let result = config.apply_overrides(|key| {
            (key == ENV_PROVIDER).then(|| "nonsense".to_string())
        });

        assert!(result.is_err());
    }

    #[test]
    fn test_command_timeout_is_opt_in() {
        let mut config = Config::default();
        assert_eq!(config.agent_settings().timeout, None);

        config.runtime.timeout_secs = 30;

        assert_eq!(config.agent_settings().timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_explicit_storage_paths_win() {
        let storage = StorageConfig {
            history_file: Some(PathBuf::from("/tmp/evolv/history.log")),
            ..StorageConfig::default()
        };

        assert_eq!(
            storage.history_file().unwrap(),
            PathBuf::from("/tmp/evolv/history.log")
        );
    }
}
