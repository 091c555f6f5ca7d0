//! JSON document store on the local file system using Tokio

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::JsonStore,
};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Stores each named document as a file inside one directory.
///
/// Writes go to a temporary sibling first and are renamed into place, so a
/// crash mid-write leaves the previous document intact.
pub struct FileJsonStore {
    dir: PathBuf,
}

impl FileJsonStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store under the platform data directory (`~/.local/share/playcore` on Linux).
    pub fn default_location() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".local")
                    .join("share")
            })
            .join("playcore");

        Self::new(data_dir)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn document_path(&self, name: &str) -> Result<PathBuf> {
        let plain = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\']);
        if !plain {
            return Err(BridgeError::OperationFailed(format!(
                "Invalid document name: {:?}",
                name
            )));
        }
        Ok(self.dir.join(name))
    }
}

impl Default for FileJsonStore {
    fn default() -> Self {
        Self::default_location()
    }
}

#[async_trait]
impl JsonStore for FileJsonStore {
    async fn save_json(&self, name: &str, text: &str) -> Result<()> {
        let path = self.document_path(name)?;
        fs::create_dir_all(&self.dir).await.map_err(BridgeError::Io)?;

        let staging = self.dir.join(format!(".{}.tmp", name));
        fs::write(&staging, text.as_bytes())
            .await
            .map_err(BridgeError::Io)?;
        fs::rename(&staging, &path).await.map_err(BridgeError::Io)?;

        debug!(path = ?path, size = text.len(), "Saved JSON document");
        Ok(())
    }

    async fn load_json(&self, name: &str) -> Result<Option<String>> {
        let path = self.document_path(name)?;
        match fs::read_to_string(&path).await {
            Ok(text) => {
                debug!(path = ?path, size = text.len(), "Loaded JSON document");
                Ok(Some(text))
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(BridgeError::Io(err)),
        }
    }
}
