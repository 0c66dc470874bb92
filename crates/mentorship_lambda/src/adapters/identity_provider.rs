use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityAttribute {
    pub name: String,
    pub value: String,
}

impl IdentityAttribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Account as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub email: String,
    pub name: String,
    pub custom_role: Option<String>,
    pub email_verified: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthTokens {
    pub access_token: String,
    pub id_token: Option<String>,
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("account already exists")]
    AlreadyExists,

    #[error("account not found")]
    NotFound,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("account is not confirmed")]
    NotConfirmed,

    #[error("invalid confirmation code")]
    InvalidCode,

    #[error("confirmation code expired")]
    ExpiredCode,

    #[error("rejected parameter: {0}")]
    InvalidParameter(String),

    #[error("identity provider fault: {0}")]
    Fault(String),
}

/// Accounts are keyed by email.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Signs up a new account and returns the provider's subject id.
    async fn create_account(
        &self,
        email: &str,
        password: &str,
        attributes: &[IdentityAttribute],
    ) -> Result<String, IdentityError>;

    async fn set_attributes(
        &self,
        email: &str,
        attributes: &[IdentityAttribute],
    ) -> Result<(), IdentityError>;

    async fn delete_account(&self, email: &str) -> Result<(), IdentityError>;

    async fn describe_account(&self, email: &str) -> Result<Identity, IdentityError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthTokens, IdentityError>;

    async fn confirm_account(&self, email: &str, code: &str) -> Result<(), IdentityError>;

    async fn resend_confirmation(&self, email: &str) -> Result<(), IdentityError>;
}
