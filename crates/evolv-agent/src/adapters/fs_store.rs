//! Filesystem Capability Store
//!
//! Units live at `<root>/<category>/<name>.<extension>`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use evolv::{CapabilityId, CapabilityStore, DomainError};

pub struct FsCapabilityStore {
    root: PathBuf,
    extension: String,
}

impl FsCapabilityStore {
    pub fn new(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            extension: extension.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root directory if it is missing
    pub async fn ensure_root(&self) -> Result<(), DomainError> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| io_error("create", &self.root, e))
    }

    pub fn unit_path(&self, id: &CapabilityId) -> PathBuf {
        self.root
            .join(id.category())
            .join(format!("{}.{}", id.name(), self.extension))
    }

    async fn entries(&self, dir: &Path) -> Result<Vec<(String, bool)>, DomainError> {
        let mut reader = match fs::read_dir(dir).await {
            Ok(reader) => reader,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error("list", dir, e)),
        };

        let mut entries = Vec::new();
        while let Some(entry) = reader
            .next_entry()
            .await
            .map_err(|e| io_error("list", dir, e))?
        {
            let is_dir = entry
                .file_type()
                .await
                .map(|t| t.is_dir())
                .unwrap_or(false);
            entries.push((entry.file_name().to_string_lossy().into_owned(), is_dir));
        }
        entries.sort();
        Ok(entries)
    }
}

#[async_trait]
impl CapabilityStore for FsCapabilityStore {
    async fn categories(&self) -> Result<Vec<String>, DomainError> {
        Ok(self
            .entries(&self.root)
            .await?
            .into_iter()
            .filter(|(_, is_dir)| *is_dir)
            .map(|(name, _)| name)
            .collect())
    }

    async fn units(&self, category: &str) -> Result<Vec<String>, DomainError> {
        let suffix = format!(".{}", self.extension);
        Ok(self
            .entries(&self.root.join(category))
            .await?
            .into_iter()
            .filter(|(_, is_dir)| !*is_dir)
            .filter_map(|(name, _)| name.strip_suffix(&suffix).map(str::to_string))
            .collect())
    }

    async fn read(&self, id: &CapabilityId) -> Result<String, DomainError> {
        let path = self.unit_path(id);
        fs::read_to_string(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => DomainError::not_found(id),
            _ => io_error("read", &path, e),
        })
    }

    async fn exists(&self, id: &CapabilityId) -> Result<bool, DomainError> {
        let path = self.unit_path(id);
        fs::try_exists(&path)
            .await
            .map_err(|e| io_error("stat", &path, e))
    }

    async fn create(&self, id: &CapabilityId, source: &str) -> Result<bool, DomainError> {
        let path = self.unit_path(id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error("create", parent, e))?;
        }

        // create_new makes the existence check and the write one step
        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
            Err(e) => return Err(io_error("create", &path, e)),
        };

        file.write_all(source.as_bytes())
            .await
            .map_err(|e| io_error("write", &path, e))?;
        file.flush()
            .await
            .map_err(|e| io_error("write", &path, e))?;
        Ok(true)
    }
}

fn io_error(action: &str, path: &Path, e: std::io::Error) -> DomainError {
    DomainError::Repository(format!("Failed to {} {:?}: {}", action, path, e))
}
