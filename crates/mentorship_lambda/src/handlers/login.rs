use mentorship_core::contract::{LoginRequest, LoginResponse};
use mentorship_core::error::ServiceError;
use mentorship_core::validation::validate_email;

use crate::adapters::identity_provider::{IdentityError, IdentityProvider};
use crate::handlers::api::{ApiGatewayRequest, ApiGatewayResponse};
use crate::notify::{ChannelFamily, Endpoint};

pub const ENDPOINT: Endpoint = Endpoint {
    handler: "LoginHandler",
    family: ChannelFamily::Auth,
    methods: "POST, OPTIONS",
};

pub async fn login(
    request: &ApiGatewayRequest,
    identity: &dyn IdentityProvider,
) -> Result<ApiGatewayResponse, ServiceError> {
    let body: LoginRequest = request.json_body()?;
    validate_email(&body.email).map_err(|_| ServiceError::validation("Email validation failed"))?;
    if body.password.is_empty() {
        return Err(ServiceError::validation("Password is required"));
    }

    let tokens = identity
        .sign_in(&body.email, &body.password)
        .await
        .map_err(|error| match error {
            IdentityError::InvalidCredentials | IdentityError::NotFound => {
                ServiceError::unauthorized("Invalid credentials")
            }
            IdentityError::NotConfirmed => ServiceError::unauthorized("User is not confirmed"),
            other => ServiceError::upstream("failed to authenticate with identity provider", other),
        })?;

    let account = identity
        .describe_account(&body.email)
        .await
        .map_err(|error| ServiceError::upstream("failed to retrieve user details", error))?;

    ApiGatewayResponse::json(
        200,
        &LoginResponse {
            email: body.email,
            is_confirmed: account.email_verified,
            access_token: tokens.access_token,
            id_token: tokens.id_token,
            refresh_token: tokens.refresh_token,
        },
    )
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;
    use crate::test_support::InMemoryIdentityProvider;

    fn event(email: &str, password: &str) -> ApiGatewayRequest {
        ApiGatewayRequest::from_event(json!({
            "body": json!({"email": email, "password": password}).to_string()
        }))
        .expect("event should decode")
    }

    #[tokio::test]
    async fn returns_tokens_and_confirmation_state() {
        let identity = InMemoryIdentityProvider::new().with_account("jo@example.com", "Abcdef1", true);

        let response = login(&event("jo@example.com", "Abcdef1"), &identity)
            .await
            .expect("login should succeed");

        assert_eq!(response.status_code, 200);
        let body: Value = serde_json::from_str(&response.body).expect("body should parse");
        assert_eq!(body["email"], "jo@example.com");
        assert_eq!(body["isConfirmed"], true);
        assert_eq!(body["access_token"], "access-jo@example.com");
        assert_eq!(body["id_token"], "id-jo@example.com");
        assert!(body.get("refresh_token").is_none());
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_are_unauthorized() {
        let identity = InMemoryIdentityProvider::new().with_account("jo@example.com", "Abcdef1", true);

        let wrong = login(&event("jo@example.com", "Nope123"), &identity)
            .await
            .expect_err("wrong password should fail");
        assert_eq!(wrong, ServiceError::unauthorized("Invalid credentials"));

        let unknown = login(&event("ghost@example.com", "Abcdef1"), &identity)
            .await
            .expect_err("unknown user should fail");
        assert_eq!(unknown.status_code(), 401);
    }

    #[tokio::test]
    async fn malformed_email_fails_validation() {
        let identity = InMemoryIdentityProvider::new();
        let error = login(&event("not-an-email", "Abcdef1"), &identity)
            .await
            .expect_err("email should be rejected");

        assert_eq!(error, ServiceError::validation("Email validation failed"));
        assert!(identity.calls().is_empty());
    }

    #[tokio::test]
    async fn unconfirmed_accounts_are_unauthorized() {
        let identity = InMemoryIdentityProvider::new()
            .with_account("jo@example.com", "Abcdef1", false)
            .failing("sign_in", IdentityError::NotConfirmed);

        let error = login(&event("jo@example.com", "Abcdef1"), &identity)
            .await
            .expect_err("unconfirmed user should fail");
        assert_eq!(error.status_code(), 401);
    }
}
