//! Port for the external asset store
//!
//! Upload failures are never fatal to the pipeline: callers fall back to
//! [`AssetStorePort::store_local`], which must always yield an addressable
//! path.

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum AssetStoreError {
    #[error("asset store not configured")]
    NotConfigured,
    #[error("upload failed: {0}")]
    Upload(String),
    #[error("asset store rejected upload: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait AssetStorePort: Send + Sync {
    /// Upload bytes and return a retrievable URL
    async fn upload(
        &self,
        bytes: &[u8],
        content_type: &str,
        name: &str,
    ) -> Result<String, AssetStoreError>;

    /// Best-effort local fallback used when `upload` fails; infallible by
    /// contract (an unwritable media dir still returns the path it would
    /// have used)
    async fn store_local(&self, bytes: &[u8], name: &str) -> String;
}
