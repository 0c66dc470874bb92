use mentorship_core::contract::{MessageResponse, ResendRequest};
use mentorship_core::error::ServiceError;
use mentorship_core::validation::validate_email;

use crate::adapters::identity_provider::{IdentityError, IdentityProvider};
use crate::handlers::api::{ApiGatewayRequest, ApiGatewayResponse};
use crate::notify::{ChannelFamily, Endpoint};

pub const ENDPOINT: Endpoint = Endpoint {
    handler: "ResendHandler",
    family: ChannelFamily::Auth,
    methods: "GET, OPTIONS",
};

/// The email comes from the `email` query parameter, or from a JSON body when
/// the parameter is absent.
pub async fn resend(
    request: &ApiGatewayRequest,
    identity: &dyn IdentityProvider,
) -> Result<ApiGatewayResponse, ServiceError> {
    let email = match request.query("email") {
        Some(email) => email.trim().to_string(),
        None if request.has_body() => request.json_body::<ResendRequest>()?.email,
        None => String::new(),
    };
    validate_email(&email).map_err(|_| ServiceError::validation("Email validation failed"))?;

    identity
        .resend_confirmation(&email)
        .await
        .map_err(|error| match error {
            IdentityError::NotFound => ServiceError::not_found("User not found"),
            IdentityError::InvalidParameter(message) => ServiceError::validation(message),
            other => ServiceError::upstream("failed to resend confirmation code", other),
        })?;

    ApiGatewayResponse::json(
        200,
        &MessageResponse::new("Confirmation code resent successfully"),
    )
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::test_support::InMemoryIdentityProvider;

    #[tokio::test]
    async fn reads_email_from_query_or_body() {
        let identity = InMemoryIdentityProvider::new().with_account("jo@example.com", "Abcdef1", false);

        let by_query = ApiGatewayRequest::from_event(json!({
            "queryStringParameters": {"email": "jo@example.com"}
        }))
        .expect("event should decode");
        let by_body = ApiGatewayRequest::from_event(json!({
            "body": "{\"email\":\"jo@example.com\"}"
        }))
        .expect("event should decode");

        for request in [by_query, by_body] {
            let response = resend(&request, &identity).await.expect("resend should succeed");
            assert_eq!(response.status_code, 200);
        }
        assert_eq!(
            identity.calls(),
            vec![
                "resend_confirmation:jo@example.com",
                "resend_confirmation:jo@example.com"
            ]
        );
    }

    #[tokio::test]
    async fn missing_email_is_a_validation_error() {
        let identity = InMemoryIdentityProvider::new();
        let request = ApiGatewayRequest::from_event(json!({})).expect("event should decode");

        assert_eq!(
            resend(&request, &identity).await,
            Err(ServiceError::validation("Email validation failed"))
        );
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let identity = InMemoryIdentityProvider::new();
        let request = ApiGatewayRequest::from_event(json!({
            "queryStringParameters": {"email": "ghost@example.com"}
        }))
        .expect("event should decode");

        assert_eq!(
            resend(&request, &identity).await.map_err(|error| error.status_code()),
            Err(404)
        );
    }
}
