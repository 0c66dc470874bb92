use mentorship_core::content_type::{infer_content_type, is_binary_content_type};
use mentorship_core::error::ServiceError;
use mentorship_core::storage_keys::download_file_name;
use mentorship_core::validation::validate_key;

use crate::adapters::blob_store::{BlobStore, BlobStoreError};
use crate::handlers::api::{ApiGatewayRequest, ApiGatewayResponse};
use crate::notify::{ChannelFamily, Endpoint};

pub const ENDPOINT: Endpoint = Endpoint {
    handler: "DownloadHandler",
    family: ChannelFamily::Files,
    methods: "GET, OPTIONS",
};

/// Streams an object back. Text is returned verbatim; anything else is
/// base64-encoded and flagged so the gateway restores the original bytes.
pub async fn download(
    request: &ApiGatewayRequest,
    blobs: &dyn BlobStore,
) -> Result<ApiGatewayResponse, ServiceError> {
    let key = request.query("key").unwrap_or_default().trim();
    validate_key(key)?;

    let object = blobs.get_object(key).await.map_err(|error| match error {
        BlobStoreError::NoSuchKey => ServiceError::not_found("File not found"),
        other => ServiceError::upstream("failed to download file", other),
    })?;

    let content_type = object
        .content_type
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| infer_content_type(key).to_string());
    let disposition = format!("attachment; filename=\"{}\"", download_file_name(key));

    let response = if is_binary_content_type(&content_type) {
        ApiGatewayResponse::binary(200, &content_type, &object.bytes)
    } else {
        match String::from_utf8(object.bytes) {
            Ok(text) => ApiGatewayResponse::text(200, &content_type, text),
            Err(raw) => ApiGatewayResponse::binary(200, &content_type, raw.as_bytes()),
        }
    };

    Ok(response.with_header("Content-Disposition", &disposition))
}

#[cfg(test)]
mod tests {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde_json::json;

    use super::*;
    use crate::test_support::InMemoryBlobStore;

    fn event(key: &str) -> ApiGatewayRequest {
        ApiGatewayRequest::from_event(json!({"queryStringParameters": {"key": key}}))
            .expect("event should decode")
    }

    #[tokio::test]
    async fn returns_text_verbatim() {
        let blobs = InMemoryBlobStore::new();
        blobs.seed_object("docs/readme.md", b"# hello", Some("text/markdown"));

        let response = download(&event("docs/readme.md"), &blobs)
            .await
            .expect("download should succeed");

        assert_eq!(response.status_code, 200);
        assert!(!response.is_base64_encoded);
        assert_eq!(response.body, "# hello");
        assert_eq!(response.header("Content-Type"), Some("text/markdown"));
        assert_eq!(
            response.header("Content-Disposition"),
            Some("attachment; filename=\"readme.md\"")
        );
    }

    #[tokio::test]
    async fn base64_encodes_binary_content() {
        let blobs = InMemoryBlobStore::new();
        let bytes = [0xff, 0xd8, 0xff, 0x00, 0x10];
        blobs.seed_object("photo.jpg", &bytes, None);

        let response = download(&event("photo.jpg"), &blobs)
            .await
            .expect("download should succeed");

        assert!(response.is_base64_encoded);
        assert_eq!(response.header("Content-Type"), Some("image/jpeg"));
        assert_eq!(STANDARD.decode(&response.body).expect("body should decode"), bytes);
    }

    #[tokio::test]
    async fn invalid_utf8_text_falls_back_to_base64() {
        let blobs = InMemoryBlobStore::new();
        blobs.seed_object("broken.txt", &[0xc3, 0x28], Some("text/plain"));

        let response = download(&event("broken.txt"), &blobs)
            .await
            .expect("download should succeed");

        assert!(response.is_base64_encoded);
        assert_eq!(
            STANDARD.decode(&response.body).expect("body should decode"),
            vec![0xc3, 0x28]
        );
    }

    #[tokio::test]
    async fn missing_key_is_not_found_and_blank_key_is_invalid() {
        let blobs = InMemoryBlobStore::new();

        assert_eq!(
            download(&event("ghost.txt"), &blobs).await,
            Err(ServiceError::not_found("File not found"))
        );
        assert_eq!(
            download(&event(""), &blobs).await,
            Err(ServiceError::validation("key is required"))
        );
    }

    #[tokio::test]
    async fn round_trips_uploaded_bytes_and_type() {
        let blobs = InMemoryBlobStore::new();
        let bytes: Vec<u8> = (0..=255).collect();
        blobs
            .put_object("data/all.bin", bytes.clone(), "application/x-raw")
            .await
            .expect("put should succeed");

        let response = download(&event("data/all.bin"), &blobs)
            .await
            .expect("download should succeed");

        assert_eq!(response.header("Content-Type"), Some("application/x-raw"));
        assert_eq!(STANDARD.decode(&response.body).expect("body should decode"), bytes);
    }
}
