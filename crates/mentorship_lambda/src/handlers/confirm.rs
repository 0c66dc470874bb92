use mentorship_core::contract::{ConfirmRequest, MessageResponse};
use mentorship_core::error::ServiceError;
use mentorship_core::validation::validate_email;

use crate::adapters::identity_provider::{IdentityError, IdentityProvider};
use crate::handlers::api::{ApiGatewayRequest, ApiGatewayResponse};
use crate::notify::{ChannelFamily, Endpoint};

pub const ENDPOINT: Endpoint = Endpoint {
    handler: "ConfirmHandler",
    family: ChannelFamily::Auth,
    methods: "POST, OPTIONS",
};

pub async fn confirm(
    request: &ApiGatewayRequest,
    identity: &dyn IdentityProvider,
) -> Result<ApiGatewayResponse, ServiceError> {
    let body: ConfirmRequest = request.json_body()?;
    validate_email(&body.email).map_err(|_| ServiceError::validation("Email validation failed"))?;
    let code = body.code.trim();
    if code.is_empty() {
        return Err(ServiceError::validation("Confirmation code is required"));
    }

    identity
        .confirm_account(&body.email, code)
        .await
        .map_err(|error| match error {
            IdentityError::InvalidCode => ServiceError::validation("Invalid confirmation code"),
            IdentityError::ExpiredCode => ServiceError::validation("Confirmation code expired"),
            IdentityError::NotFound => ServiceError::not_found("User not found"),
            other => ServiceError::upstream("failed to confirm sign-up", other),
        })?;

    ApiGatewayResponse::json(200, &MessageResponse::new("Email confirmed successfully"))
}
