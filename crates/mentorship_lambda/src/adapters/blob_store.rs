use async_trait::async_trait;
use mentorship_core::contract::FileEntry;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// One page of a listing. `next_token` is `None` on the last page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectPage {
    pub items: Vec<FileEntry>,
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlobStoreError {
    #[error("NoSuchKey")]
    NoSuchKey,

    #[error("blob store fault: {0}")]
    Fault(String),
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Writes (or overwrites) an object and returns its retrievable URL.
    async fn put_object(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, BlobStoreError>;

    async fn get_object(&self, key: &str) -> Result<StoredObject, BlobStoreError>;

    async fn list_objects(
        &self,
        continuation_token: Option<&str>,
    ) -> Result<ObjectPage, BlobStoreError>;

    /// Fails with [`BlobStoreError::NoSuchKey`] when nothing is stored under `key`.
    async fn delete_object(&self, key: &str) -> Result<(), BlobStoreError>;

    /// Public URL an object under `key` is served from.
    fn object_url(&self, key: &str) -> String;
}
