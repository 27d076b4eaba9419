//! File-system implementation of the byte-storage collaborator.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use storage_traits::{BlobStore, Result};
use tokio::fs;
use tracing::debug;

/// Directory-of-files [`BlobStore`]: one file per key.
///
/// Writes go to a temp file first and land via `rename`, so a concurrent
/// reader observes either the old value or the new one, never a torn
/// record.
pub struct FsBlobStore {
    dir: PathBuf,
}

impl FsBlobStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The conventional per-user data directory, when the platform has one.
    pub fn default_dir() -> Option<PathBuf> {
        dirs::data_dir().map(|d| d.join("unistore"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Map a key to a file name. Keys may contain separators and other
    /// characters unfit for file names; anything outside a conservative set
    /// is replaced.
    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(name)
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        fs::create_dir_all(&self.dir).await?;
        let target = self.path_for(key);
        let mut staged = target.clone().into_os_string();
        staged.push(".tmp");
        let staged = PathBuf::from(staged);
        fs::write(&staged, value).await?;
        fs::rename(&staged, &target).await?;
        debug!(key, bytes = value.len(), "stored blob");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match fs::read(self.path_for(key)).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        match fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
