//! API credential registry stored as a JSON object `{ name: note }`.
//!
//! Entries are only ever added; a second note for the same name is ignored.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::Mutex;

use evolv::{CredentialSink, DomainError};

pub struct JsonCredentialRegistry {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonCredentialRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    async fn read_entries(&self) -> Result<BTreeMap<String, String>, DomainError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(DomainError::Repository(format!(
                    "Failed to read {:?}: {}",
                    self.path, e
                )))
            }
        };
        serde_json::from_str(&content).map_err(|e| {
            DomainError::Repository(format!("Malformed credential registry {:?}: {}", self.path, e))
        })
    }
}

#[async_trait]
impl CredentialSink for JsonCredentialRegistry {
    async fn record(&self, name: &str, note: &str) -> Result<(), DomainError> {
        let _guard = self.write_lock.lock().await;

        let mut entries = self.read_entries().await?;
        if entries.contains_key(name) {
            return Ok(());
        }
        entries.insert(name.to_string(), note.to_string());

        let content = serde_json::to_string_pretty(&entries)
            .map_err(|e| DomainError::Repository(e.to_string()))?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| DomainError::Repository(e.to_string()))?;
        }
        fs::write(&self.path, content)
            .await
            .map_err(|e| DomainError::Repository(format!("Failed to write {:?}: {}", self.path, e)))?;

        tracing::info!("🔑 Command '{}' needs an API key; noted in {:?}", name, self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_note_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("api_credentials.json");
        let registry = JsonCredentialRegistry::new(&path);

        registry.record("get_weather", "needs OpenWeather key").await.unwrap();
        registry.record("get_weather", "something else").await.unwrap();
        registry.record("stock_price", "needs market data key").await.unwrap();

        let stored: BTreeMap<String, String> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored["get_weather"], "needs OpenWeather key");
    }
}
