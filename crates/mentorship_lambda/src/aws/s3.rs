use std::error::Error as StdError;

use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use mentorship_core::contract::FileEntry;
use mentorship_core::storage_keys::public_object_url;

use crate::adapters::blob_store::{BlobStore, BlobStoreError, ObjectPage, StoredObject};

#[derive(Clone)]
pub struct S3BlobStore {
    client: Client,
    bucket: String,
}

impl S3BlobStore {
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

fn fault<E: StdError>(context: &str, error: E) -> BlobStoreError {
    BlobStoreError::Fault(format!("{context}: {}", DisplayErrorContext(error)))
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put_object(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, BlobStoreError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|error| fault("failed to write object to s3", error))?;

        Ok(self.object_url(key))
    }

    async fn get_object(&self, key: &str) -> Result<StoredObject, BlobStoreError> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|error| match error.as_service_error() {
                Some(service) if service.is_no_such_key() => BlobStoreError::NoSuchKey,
                _ => fault("failed to read object from s3", error),
            })?;

        let content_type = output.content_type().map(str::to_string);
        let bytes = output
            .body
            .collect()
            .await
            .map_err(|error| fault("failed to read object body", error))?
            .into_bytes()
            .to_vec();

        Ok(StoredObject {
            bytes,
            content_type,
        })
    }

    async fn list_objects(
        &self,
        continuation_token: Option<&str>,
    ) -> Result<ObjectPage, BlobStoreError> {
        let output = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .set_continuation_token(continuation_token.map(str::to_string))
            .send()
            .await
            .map_err(|error| fault("failed to list objects", error))?;

        let items = output
            .contents()
            .iter()
            .filter_map(|object| {
                object.key().map(|key| FileEntry {
                    key: key.to_string(),
                    size: object.size().unwrap_or_default(),
                })
            })
            .collect();
        let next_token = if output.is_truncated().unwrap_or(false) {
            output.next_continuation_token().map(str::to_string)
        } else {
            None
        };

        Ok(ObjectPage { items, next_token })
    }

    /// S3 deletes are idempotent, so existence is checked first to report
    /// [`BlobStoreError::NoSuchKey`].
    async fn delete_object(&self, key: &str) -> Result<(), BlobStoreError> {
        self.client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|error| match error.as_service_error() {
                Some(service) if service.is_not_found() => BlobStoreError::NoSuchKey,
                _ => fault("failed to inspect object", error),
            })?;

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map(|_| ())
            .map_err(|error| fault("failed to delete object", error))
    }

    fn object_url(&self, key: &str) -> String {
        public_object_url(&self.bucket, key)
    }
}
