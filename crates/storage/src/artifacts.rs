//! Durable hosting of generated artifacts.

use async_trait::async_trait;

use crate::error::StorageError;

/// Stores generated images and returns their public URL.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Upload `bytes` under `name` and return the URL the object is
    /// served from.
    async fn store(
        &self,
        name: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError>;
}
