use mentorship_core::contract::MessageResponse;
use mentorship_core::error::ServiceError;
use mentorship_core::validation::validate_key;

use crate::adapters::blob_store::{BlobStore, BlobStoreError};
use crate::handlers::api::{ApiGatewayRequest, ApiGatewayResponse};
use crate::notify::{ChannelFamily, Endpoint};

pub const ENDPOINT: Endpoint = Endpoint {
    handler: "DeleteHandler",
    family: ChannelFamily::Files,
    methods: "DELETE, OPTIONS",
};

/// Deleting an absent key is reported as 404 so callers can tell it apart
/// from a deletion that happened.
pub async fn delete(
    request: &ApiGatewayRequest,
    blobs: &dyn BlobStore,
) -> Result<ApiGatewayResponse, ServiceError> {
    let key = request.query("key").unwrap_or_default().trim();
    validate_key(key)?;

    blobs.delete_object(key).await.map_err(|error| match error {
        BlobStoreError::NoSuchKey => ServiceError::not_found("File not found"),
        other => ServiceError::upstream("failed to delete file", other),
    })?;

    ApiGatewayResponse::json(200, &MessageResponse::new("File deleted successfully"))
}
