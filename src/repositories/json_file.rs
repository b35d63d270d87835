use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

use super::traits::EntryStore;
use crate::errors::AppResult;
use crate::models::Entry;

/// Entry store backed by a single pretty-printed JSON array on disk
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling file the next document is staged in before the rename
    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "entries.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn ensure_parent_dir(&self) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl EntryStore for JsonFileStore {
    async fn load_all(&self) -> Vec<Entry> {
        let contents = match fs::read(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Catalog document absent, starting empty");
                return Vec::new();
            }
            Err(e) => {
                warn!(path = %self.path.display(), "Failed to read catalog document: {}", e);
                return Vec::new();
            }
        };

        match serde_json::from_slice::<Vec<Entry>>(&contents) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %self.path.display(), "Catalog document is not a valid entry list: {}", e);
                Vec::new()
            }
        }
    }

    async fn save_all(&self, entries: &[Entry]) -> AppResult<()> {
        self.ensure_parent_dir().await?;

        let document = serde_json::to_vec_pretty(entries)?;
        let staging = self.staging_path();
        fs::write(&staging, &document).await?;
        fs::rename(&staging, &self.path).await?;

        debug!(
            path = %self.path.display(),
            entries = entries.len(),
            bytes = document.len(),
            "Catalog document written"
        );
        Ok(())
    }
}
