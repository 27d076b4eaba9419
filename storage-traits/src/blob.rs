//! Key/value byte-storage collaborator.

use async_trait::async_trait;

use crate::error::Result;

/// Durable key/value byte storage.
///
/// The credential store persists its records through this trait; the
/// canonical implementation is a directory of files, one per key, but tests
/// substitute an in-memory map.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store a value under a key, overwriting any prior value.
    async fn put(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Retrieve a value; `Ok(None)` when the key does not exist.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Delete a key. Returns whether a value existed.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Check existence without retrieving the value.
    async fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }
}
