//! `POST /upload`: JSON with base64 content, or `multipart/form-data`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use mentorship_core::content_type::resolve_content_type;
use mentorship_core::contract::{UploadRequest, UploadResponse};
use mentorship_core::error::ServiceError;
use mentorship_core::multipart::{
    boundary_from_content_type, field_value, first_file_part, is_multipart, parse_multipart,
};
use mentorship_core::validation::validate_key;
use tracing::info;

use crate::adapters::blob_store::BlobStore;
use crate::handlers::api::{ApiGatewayRequest, ApiGatewayResponse, FILE_CONTENT_TYPE_HEADER};
use crate::notify::{ChannelFamily, Endpoint};

pub const ENDPOINT: Endpoint = Endpoint {
    handler: "UploadHandler",
    family: ChannelFamily::Files,
    methods: "POST, OPTIONS",
};

/// Multipart fields that name the target key, in priority order.
const KEY_FIELDS: [&str; 2] = ["file_name", "key"];

#[derive(Debug, Clone, PartialEq, Eq)]
struct UploadPayload {
    key: String,
    bytes: Vec<u8>,
    part_content_type: Option<String>,
}

pub async fn upload(
    request: &ApiGatewayRequest,
    blobs: &dyn BlobStore,
) -> Result<ApiGatewayResponse, ServiceError> {
    let payload = match request.header("content-type") {
        Some(content_type) if is_multipart(content_type) => {
            multipart_payload(request, content_type)?
        }
        _ => json_payload(request)?,
    };
    validate_key(&payload.key)?;

    let declared = request
        .header(FILE_CONTENT_TYPE_HEADER)
        .or(payload.part_content_type.as_deref());
    let content_type = resolve_content_type(declared, &payload.key);
    let size = payload.bytes.len();

    let url = blobs
        .put_object(&payload.key, payload.bytes, &content_type)
        .await
        .map_err(|error| ServiceError::upstream("failed to upload file", error))?;

    info!(
        component = "upload",
        event = "file_uploaded",
        key = %payload.key,
        content_type = %content_type,
        size,
        "file uploaded"
    );

    let include_url = request
        .query("include_url")
        .is_some_and(|value| value.eq_ignore_ascii_case("true"));
    ApiGatewayResponse::json(
        200,
        &UploadResponse {
            message: "File uploaded successfully".to_string(),
            key: payload.key,
            file_url: include_url.then_some(url),
        },
    )
}

fn json_payload(request: &ApiGatewayRequest) -> Result<UploadPayload, ServiceError> {
    let body: UploadRequest = request.json_body()?;
    let bytes = STANDARD
        .decode(body.file_content.trim())
        .map_err(|_| ServiceError::validation("Invalid file data: content is not valid base64"))?;

    Ok(UploadPayload {
        key: body.file_name.trim().to_string(),
        bytes,
        part_content_type: None,
    })
}

fn multipart_payload(
    request: &ApiGatewayRequest,
    content_type: &str,
) -> Result<UploadPayload, ServiceError> {
    let boundary = boundary_from_content_type(content_type)?;
    let body = request.body_bytes()?;
    let parts = parse_multipart(&body, &boundary)?;
    let file = first_file_part(&parts)?;

    let key = KEY_FIELDS
        .iter()
        .find_map(|name| field_value(&parts, name).filter(|value| !value.is_empty()))
        .or(file.file_name.as_deref())
        .unwrap_or_default()
        .trim()
        .to_string();

    Ok(UploadPayload {
        key,
        bytes: file.data.clone(),
        part_content_type: file.content_type.clone(),
    })
}
