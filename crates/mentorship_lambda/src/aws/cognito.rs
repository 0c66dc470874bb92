use std::error::Error as StdError;

use async_trait::async_trait;
use aws_sdk_cognitoidentityprovider::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_cognitoidentityprovider::types::{AttributeType, AuthFlowType};
use aws_sdk_cognitoidentityprovider::Client;

use crate::adapters::identity_provider::{
    AuthTokens, Identity, IdentityAttribute, IdentityError, IdentityProvider,
};

/// Cognito user pool accessed through an app client. Self-service calls use
/// the client id; administrative calls use the pool id.
#[derive(Clone)]
pub struct CognitoIdentityProvider {
    client: Client,
    client_id: String,
    user_pool_id: String,
}

impl CognitoIdentityProvider {
    pub fn new(client: Client, client_id: impl Into<String>, user_pool_id: impl Into<String>) -> Self {
        Self {
            client,
            client_id: client_id.into(),
            user_pool_id: user_pool_id.into(),
        }
    }
}

fn fault<E: StdError>(error: E) -> IdentityError {
    IdentityError::Fault(DisplayErrorContext(error).to_string())
}

fn invalid_parameter(error: &impl ProvideErrorMetadata) -> IdentityError {
    IdentityError::InvalidParameter(
        error
            .message()
            .unwrap_or("request rejected by identity provider")
            .to_string(),
    )
}

fn to_attribute_types(attributes: &[IdentityAttribute]) -> Result<Vec<AttributeType>, IdentityError> {
    attributes
        .iter()
        .map(|attribute| {
            AttributeType::builder()
                .name(&attribute.name)
                .value(&attribute.value)
                .build()
                .map_err(fault)
        })
        .collect()
}

#[async_trait]
impl IdentityProvider for CognitoIdentityProvider {
    async fn create_account(
        &self,
        email: &str,
        password: &str,
        attributes: &[IdentityAttribute],
    ) -> Result<String, IdentityError> {
        let output = self
            .client
            .sign_up()
            .client_id(&self.client_id)
            .username(email)
            .password(password)
            .set_user_attributes(Some(to_attribute_types(attributes)?))
            .send()
            .await
            .map_err(|error| match error.as_service_error() {
                Some(service) if service.is_username_exists_exception() => {
                    IdentityError::AlreadyExists
                }
                Some(service)
                    if service.is_invalid_password_exception()
                        || service.is_invalid_parameter_exception() =>
                {
                    invalid_parameter(service)
                }
                _ => fault(error),
            })?;

        Ok(output.user_sub().to_string())
    }

    async fn set_attributes(
        &self,
        email: &str,
        attributes: &[IdentityAttribute],
    ) -> Result<(), IdentityError> {
        self.client
            .admin_update_user_attributes()
            .user_pool_id(&self.user_pool_id)
            .username(email)
            .set_user_attributes(Some(to_attribute_types(attributes)?))
            .send()
            .await
            .map(|_| ())
            .map_err(|error| match error.as_service_error() {
                Some(service) if service.is_user_not_found_exception() => IdentityError::NotFound,
                Some(service) if service.is_invalid_parameter_exception() => {
                    invalid_parameter(service)
                }
                _ => fault(error),
            })
    }

    async fn delete_account(&self, email: &str) -> Result<(), IdentityError> {
        self.client
            .admin_delete_user()
            .user_pool_id(&self.user_pool_id)
            .username(email)
            .send()
            .await
            .map(|_| ())
            .map_err(|error| match error.as_service_error() {
                Some(service) if service.is_user_not_found_exception() => IdentityError::NotFound,
                _ => fault(error),
            })
    }

    async fn describe_account(&self, email: &str) -> Result<Identity, IdentityError> {
        let output = self
            .client
            .admin_get_user()
            .user_pool_id(&self.user_pool_id)
            .username(email)
            .send()
            .await
            .map_err(|error| match error.as_service_error() {
                Some(service) if service.is_user_not_found_exception() => IdentityError::NotFound,
                _ => fault(error),
            })?;

        let attribute = |name: &str| {
            output
                .user_attributes()
                .iter()
                .find(|attribute| attribute.name() == name)
                .and_then(|attribute| attribute.value())
                .map(str::to_string)
        };

        Ok(Identity {
            email: attribute("email").unwrap_or_else(|| email.to_string()),
            name: attribute("name").unwrap_or_default(),
            custom_role: attribute("custom:role"),
            email_verified: attribute("email_verified").is_some_and(|value| value == "true"),
        })
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthTokens, IdentityError> {
        let output = self
            .client
            .initiate_auth()
            .auth_flow(AuthFlowType::UserPasswordAuth)
            .client_id(&self.client_id)
            .auth_parameters("USERNAME", email)
            .auth_parameters("PASSWORD", password)
            .send()
            .await
            .map_err(|error| match error.as_service_error() {
                Some(service) if service.is_not_authorized_exception() => {
                    IdentityError::InvalidCredentials
                }
                Some(service) if service.is_user_not_found_exception() => IdentityError::NotFound,
                Some(service) if service.is_user_not_confirmed_exception() => {
                    IdentityError::NotConfirmed
                }
                _ => fault(error),
            })?;

        let result = output.authentication_result().ok_or_else(|| {
            IdentityError::Fault("empty authentication result from Cognito".to_string())
        })?;
        let access_token = result
            .access_token()
            .ok_or_else(|| IdentityError::Fault("authentication result has no access token".to_string()))?;

        Ok(AuthTokens {
            access_token: access_token.to_string(),
            id_token: result.id_token().map(str::to_string),
            refresh_token: result.refresh_token().map(str::to_string),
        })
    }

    async fn confirm_account(&self, email: &str, code: &str) -> Result<(), IdentityError> {
        self.client
            .confirm_sign_up()
            .client_id(&self.client_id)
            .username(email)
            .confirmation_code(code)
            .send()
            .await
            .map(|_| ())
            .map_err(|error| match error.as_service_error() {
                Some(service) if service.is_code_mismatch_exception() => IdentityError::InvalidCode,
                Some(service) if service.is_expired_code_exception() => IdentityError::ExpiredCode,
                Some(service) if service.is_user_not_found_exception() => IdentityError::NotFound,
                _ => fault(error),
            })
    }

    async fn resend_confirmation(&self, email: &str) -> Result<(), IdentityError> {
        self.client
            .resend_confirmation_code()
            .client_id(&self.client_id)
            .username(email)
            .send()
            .await
            .map(|_| ())
            .map_err(|error| match error.as_service_error() {
                Some(service) if service.is_user_not_found_exception() => IdentityError::NotFound,
                Some(service) if service.is_invalid_parameter_exception() => {
                    invalid_parameter(service)
                }
                _ => fault(error),
            })
    }
}
