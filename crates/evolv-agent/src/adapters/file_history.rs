//! Append-only history log file, one record per line.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use evolv::{DomainError, HistorySink};

pub struct FileHistory {
    path: PathBuf,
}

impl FileHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn error(&self, action: &str, e: std::io::Error) -> DomainError {
        DomainError::Repository(format!("Failed to {} {:?}: {}", action, self.path, e))
    }
}

#[async_trait]
impl HistorySink for FileHistory {
    async fn append(&self, line: &str) -> Result<(), DomainError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| self.error("create directory for", e))?;
        }

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| self.error("open", e))?;
        file.write_all(format!("{}\n", line).as_bytes())
            .await
            .map_err(|e| self.error("append to", e))?;
        file.flush().await.map_err(|e| self.error("append to", e))
    }

    async fn read_all(&self) -> Result<Vec<String>, DomainError> {
        match fs::read_to_string(&self.path).await {
            Ok(content) => Ok(content.lines().map(str::to_string).collect()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(self.error("read", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_append_and_read_back_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileHistory::new(dir.path().join("nested").join("history.log"));

        assert!(sink.read_all().await.unwrap().is_empty());
        sink.append("first").await.unwrap();
        sink.append("second").await.unwrap();

        assert_eq!(sink.read_all().await.unwrap(), vec!["first", "second"]);
    }
}
