//! Local-disk object storage. Uploaded objects are served back by the
//! router under `public_base_url`.

use std::path::{Component, Path, PathBuf};

use tracing::debug;

use super::ports::ObjectStorage;
use super::StorageError;

#[derive(Clone, Debug)]
pub struct LocalDiskStorage {
  root: PathBuf,
  public_base_url: String,
}

impl LocalDiskStorage {
  pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
    Self { root: root.into(), public_base_url: public_base_url.into() }
  }

  /// Only plain relative paths are accepted.
  fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
    let rel = Path::new(path);
    let plain = !path.is_empty() && rel.components().all(|c| matches!(c, Component::Normal(_)));
    if !plain {
      return Err(StorageError::InvalidPath(path.to_string()));
    }
    Ok(self.root.join(rel))
  }
}

#[async_trait::async_trait]
impl ObjectStorage for LocalDiskStorage {
  async fn upload(&self, path: &str, bytes: &[u8]) -> Result<(), StorageError> {
    let target = self.resolve(path)?;
    if let Some(dir) = target.parent() {
      tokio::fs::create_dir_all(dir).await?;
    }
    tokio::fs::write(&target, bytes).await?;
    debug!(target: "chat", %path, size = bytes.len(), "Object stored");
    Ok(())
  }

  fn public_url(&self, path: &str) -> String {
    format!("{}/{}", self.public_base_url.trim_end_matches('/'), path)
  }
}
