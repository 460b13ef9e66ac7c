use async_trait::async_trait;
use fogmap_core::error::Result;

/// Port for opaque key/value persistence
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Read the bytes stored under `key`, `None` if nothing was ever written
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Replace the bytes stored under `key`
    async fn set(&self, key: &str, bytes: Vec<u8>) -> Result<()>;
}
