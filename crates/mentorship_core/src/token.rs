use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::error::ServiceError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("authorization header is missing")]
    MissingAuthorization,

    #[error("ID token is missing")]
    MissingToken,

    #[error("invalid ID token format")]
    InvalidTokenFormat,

    #[error("failed to decode ID token payload")]
    UndecodablePayload,

    #[error("email not found in ID token")]
    EmailNotFound,
}

impl From<TokenError> for ServiceError {
    fn from(error: TokenError) -> Self {
        ServiceError::Unauthorized(error.to_string())
    }
}

/// Claims read from a Cognito ID token. The signature is verified by the API
/// Gateway authorizer before the request reaches a handler.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdTokenClaims {
    #[serde(default)]
    pub email: String,
    #[serde(default, rename = "custom:role")]
    pub custom_role: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub email_verified: bool,
    #[serde(default)]
    pub sub: String,
}

/// Extracts the token from `Bearer <token>`.
pub fn parse_bearer_token(header: Option<&str>) -> Result<&str, TokenError> {
    let header = header
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(TokenError::MissingAuthorization)?;

    let token = header
        .strip_prefix("Bearer")
        .filter(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
        .and_then(|rest| rest.split_whitespace().next())
        .ok_or(TokenError::MissingToken)?;

    Ok(token)
}

pub fn decode_id_token(token: &str) -> Result<IdTokenClaims, TokenError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(TokenError::InvalidTokenFormat);
    }

    let payload = URL_SAFE_NO_PAD
        .decode(parts[1].trim_end_matches('='))
        .map_err(|_| TokenError::UndecodablePayload)?;
    let claims: IdTokenClaims =
        serde_json::from_slice(&payload).map_err(|_| TokenError::UndecodablePayload)?;

    if claims.email.is_empty() {
        return Err(TokenError::EmailNotFound);
    }

    Ok(claims)
}

fn flexible_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(value) => value,
        Value::String(text) => text.eq_ignore_ascii_case("true"),
        _ => false,
    })
}
