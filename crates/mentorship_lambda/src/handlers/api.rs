//! API Gateway proxy event decoding and response encoding.

use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use mentorship_core::error::ServiceError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

pub const ALLOWED_HEADERS: &str = "Content-Type, Authorization, x-file-content-type";
pub const FILE_CONTENT_TYPE_HEADER: &str = "x-file-content-type";
pub const MANUAL_CLEANUP_HEADER: &str = "X-Manual-Cleanup-Required";
pub const JSON_CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiGatewayRequest {
    body: Value,
    is_base64_encoded: bool,
    headers: HashMap<String, String>,
    query: HashMap<String, String>,
    claims: Option<Map<String, Value>>,
}

impl ApiGatewayRequest {
    pub fn from_event(event: Value) -> Result<Self, ServiceError> {
        let Value::Object(mut object) = event else {
            return Err(ServiceError::validation(
                "Request payload must be a JSON object",
            ));
        };

        let headers = string_map(object.get("headers"))
            .into_iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value))
            .collect();
        let query = string_map(object.get("queryStringParameters"));
        let claims = object
            .get("requestContext")
            .and_then(|context| context.get("authorizer"))
            .and_then(|authorizer| authorizer.get("claims"))
            .and_then(Value::as_object)
            .filter(|claims| !claims.is_empty())
            .cloned();
        let is_base64_encoded = object
            .get("isBase64Encoded")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        Ok(Self {
            body: object.remove("body").unwrap_or(Value::Null),
            is_base64_encoded,
            headers,
            query,
            claims,
        })
    }

    /// Case-insensitive header lookup. Blank values count as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }

    pub fn query(&self, name: &str) -> Option<&str> {
        self.query
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }

    pub fn claims(&self) -> Option<&Map<String, Value>> {
        self.claims.as_ref()
    }

    pub fn has_body(&self) -> bool {
        match &self.body {
            Value::Null => false,
            Value::String(text) => !text.trim().is_empty(),
            _ => true,
        }
    }

    /// Raw body bytes, base64-decoded when the gateway wrapped them.
    pub fn body_bytes(&self) -> Result<Vec<u8>, ServiceError> {
        match &self.body {
            Value::Null => Ok(Vec::new()),
            Value::String(text) if self.is_base64_encoded => STANDARD
                .decode(text.trim())
                .map_err(|_| ServiceError::validation("Request body is not valid base64")),
            Value::String(text) => Ok(text.as_bytes().to_vec()),
            other => Ok(other.to_string().into_bytes()),
        }
    }

    pub fn json_body<T: DeserializeOwned>(&self) -> Result<T, ServiceError> {
        let malformed =
            |error: serde_json::Error| ServiceError::validation(format!("Invalid request body: {error}"));

        match &self.body {
            Value::Null => Err(ServiceError::validation("Request body is required")),
            Value::Object(_) => serde_json::from_value(self.body.clone()).map_err(malformed),
            Value::String(_) => {
                let bytes = self.body_bytes()?;
                if bytes.iter().all(u8::is_ascii_whitespace) {
                    return Err(ServiceError::validation("Request body is required"));
                }
                serde_json::from_slice(&bytes).map_err(malformed)
            }
            _ => Err(ServiceError::validation(
                "Request body must be a JSON object",
            )),
        }
    }
}

fn string_map(value: Option<&Value>) -> HashMap<String, String> {
    value
        .and_then(Value::as_object)
        .map(|object| {
            object
                .iter()
                .filter_map(|(name, value)| {
                    value.as_str().map(|text| (name.clone(), text.to_string()))
                })
                .collect()
        })
        .unwrap_or_default()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiGatewayResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub headers: Value,
    pub body: String,
    #[serde(rename = "isBase64Encoded", default)]
    pub is_base64_encoded: bool,
}

impl ApiGatewayResponse {
    pub fn json(status_code: u16, payload: &impl Serialize) -> Result<Self, ServiceError> {
        let body = serde_json::to_string(payload)
            .map_err(|error| ServiceError::upstream("failed to serialize response", error))?;
        Ok(Self::text(status_code, JSON_CONTENT_TYPE, body))
    }

    pub fn text(status_code: u16, content_type: &str, body: String) -> Self {
        Self {
            status_code,
            headers: json!({ "Content-Type": content_type }),
            body,
            is_base64_encoded: false,
        }
    }

    pub fn binary(status_code: u16, content_type: &str, bytes: &[u8]) -> Self {
        Self {
            is_base64_encoded: true,
            ..Self::text(status_code, content_type, STANDARD.encode(bytes))
        }
    }

    pub fn from_error(error: &ServiceError) -> Self {
        let mut payload = json!({
            "error": error.public_message(),
            "code": error.code(),
        });
        let mut response = Self::text(error.status_code(), JSON_CONTENT_TYPE, String::new());

        if error.requires_manual_cleanup() {
            payload["manual_cleanup_required"] = Value::Bool(true);
            response = response.with_header(MANUAL_CLEANUP_HEADER, "true");
        }

        response.body = payload.to_string();
        response
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let Value::Object(headers) = &mut self.headers {
            headers.insert(name.to_string(), Value::String(value.to_string()));
        }
        self
    }

    pub fn with_cors(self, methods: &str) -> Self {
        self.with_header("Access-Control-Allow-Origin", "*")
            .with_header("Access-Control-Allow-Methods", methods)
            .with_header("Access-Control-Allow-Headers", ALLOWED_HEADERS)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(Value::as_str)
    }
}
