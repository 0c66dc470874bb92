use mentorship_core::contract::FileEntry;
use mentorship_core::error::ServiceError;

use crate::adapters::blob_store::BlobStore;
use crate::handlers::api::{ApiGatewayRequest, ApiGatewayResponse};
use crate::notify::{ChannelFamily, Endpoint};

pub const ENDPOINT: Endpoint = Endpoint {
    handler: "ListHandler",
    family: ChannelFamily::Files,
    methods: "GET, OPTIONS",
};

pub async fn list(
    request: &ApiGatewayRequest,
    blobs: &dyn BlobStore,
) -> Result<ApiGatewayResponse, ServiceError> {
    if request.claims().is_none() {
        return Err(ServiceError::unauthorized(
            "Unauthorized: User is not logged in",
        ));
    }

    let files = list_all(blobs).await?;
    ApiGatewayResponse::json(200, &files)
}

/// Follows continuation tokens until the store stops returning one.
pub async fn list_all(blobs: &dyn BlobStore) -> Result<Vec<FileEntry>, ServiceError> {
    let mut files = Vec::new();
    let mut token: Option<String> = None;

    loop {
        let page = blobs
            .list_objects(token.as_deref())
            .await
            .map_err(|error| ServiceError::upstream("failed to list files", error))?;
        files.extend(page.items);

        match page.next_token {
            None => return Ok(files),
            Some(next) if token.as_deref() == Some(next.as_str()) => {
                return Err(ServiceError::upstream(
                    "failed to list files",
                    format!("continuation token {next} repeated"),
                ));
            }
            Some(next) => token = Some(next),
        }
    }
}
