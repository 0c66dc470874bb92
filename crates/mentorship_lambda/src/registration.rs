//! Registration saga: identity, role tag, profile picture, profile record.
//!
//! Only the identity is compensated. The picture object is keyed by email and
//! overwritten by the next attempt, and the profile record is the last step,
//! so nothing after it can fail.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use mentorship_core::content_type::resolve_content_type;
use mentorship_core::contract::{ProfileRecord, RegistrationRequest, Role, ROLE_ATTRIBUTE};
use mentorship_core::error::ServiceError;
use mentorship_core::storage_keys::profile_picture_key;
use mentorship_core::validation::validate_fields;
use thiserror::Error;
use tracing::{error, info, Instrument};

use crate::adapters::blob_store::{BlobStore, BlobStoreError};
use crate::adapters::identity_provider::{IdentityAttribute, IdentityError, IdentityProvider};
use crate::adapters::profile_store::{ProfileStore, ProfileStoreError};
use crate::saga::{Saga, SagaContext, SagaFailure, SagaStep};

pub const SAGA_NAME: &str = "registration";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationState {
    Start,
    IdentityCreated,
    RoleTagged,
    PictureUploaded,
    ProfilePersisted,
    Compensating,
    Failed,
}

/// Validated and decoded registration input. Building one performs every
/// local check, so a saga never starts on input that could be rejected
/// without a remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub picture: Vec<u8>,
    pub picture_content_type: String,
    pub file_name: String,
}

impl RegistrationInput {
    pub fn from_request(
        request: RegistrationRequest,
        declared_content_type: Option<&str>,
    ) -> Result<Self, ServiceError> {
        let name = request.name.trim();
        let role = validate_fields(
            name,
            &request.email,
            &request.password,
            &request.role,
        )?;

        let encoded = request.profile_picture.trim();
        if encoded.is_empty() {
            return Err(ServiceError::validation("profile picture is required"));
        }
        let picture = STANDARD
            .decode(strip_data_url_prefix(encoded))
            .map_err(|_| ServiceError::validation("profile picture is not valid base64"))?;
        if picture.is_empty() {
            return Err(ServiceError::validation("profile picture is required"));
        }

        let file_name = request.file_name.trim().to_string();
        Ok(Self {
            picture_content_type: resolve_content_type(declared_content_type, &file_name),
            name: name.to_string(),
            email: request.email,
            password: request.password,
            role,
            picture,
            file_name,
        })
    }
}

fn strip_data_url_prefix(encoded: &str) -> &str {
    match encoded.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => encoded,
    }
}

#[derive(Debug)]
pub struct RegistrationContext {
    pub input: RegistrationInput,
    pub subject: Option<String>,
    pub profile_pic_url: Option<String>,
    pub history: Vec<RegistrationState>,
}

impl RegistrationContext {
    fn new(input: RegistrationInput) -> Self {
        Self {
            input,
            subject: None,
            profile_pic_url: None,
            history: vec![RegistrationState::Start],
        }
    }

    fn advance(&mut self, state: RegistrationState) {
        self.history.push(state);
    }
}

impl SagaContext for RegistrationContext {
    fn mark_compensating(&mut self) {
        self.advance(RegistrationState::Compensating);
    }

    fn mark_failed(&mut self) {
        self.advance(RegistrationState::Failed);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("failed to create identity: {0}")]
    IdentityCreationFailed(IdentityError),

    #[error("failed to tag identity role: {0}")]
    IdentityUpdateFailed(IdentityError),

    #[error("failed to upload profile picture: {0}")]
    ProfilePictureUploadFailed(BlobStoreError),

    #[error("failed to persist profile: {0}")]
    ProfilePersistFailed(ProfileStoreError),

    #[error("failed to delete identity: {0}")]
    IdentityDeletionFailed(IdentityError),

    /// A step failed and deleting the identity failed too. The identity is
    /// orphaned.
    #[error("{trigger}; compensation failed: {compensation}")]
    CompensationFailed {
        step: &'static str,
        identity: String,
        trigger: Box<RegistrationError>,
        compensation: Box<RegistrationError>,
    },
}

impl From<RegistrationError> for ServiceError {
    fn from(error: RegistrationError) -> Self {
        match error {
            RegistrationError::IdentityCreationFailed(IdentityError::AlreadyExists) => {
                ServiceError::conflict("User already exists")
            }
            RegistrationError::IdentityCreationFailed(IdentityError::InvalidParameter(message)) => {
                ServiceError::validation(message)
            }
            RegistrationError::ProfilePersistFailed(ProfileStoreError::ConditionFailed) => {
                ServiceError::conflict("User profile already exists")
            }
            RegistrationError::CompensationFailed {
                step,
                identity,
                trigger,
                compensation,
            } => ServiceError::CompensationFailure {
                step: step.to_string(),
                identity,
                trigger: trigger.to_string(),
                compensation: compensation.to_string(),
            },
            other => ServiceError::upstream("registration failed", other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationOutcome {
    pub user_id: String,
    /// Subject id the identity provider assigned to the new account.
    pub subject: String,
    pub profile_pic_url: String,
    pub history: Vec<RegistrationState>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationFailure {
    pub error: RegistrationError,
    pub history: Vec<RegistrationState>,
}

impl From<RegistrationFailure> for ServiceError {
    fn from(failure: RegistrationFailure) -> Self {
        failure.error.into()
    }
}

struct CreateIdentity<'a> {
    identity: &'a dyn IdentityProvider,
}

#[async_trait]
impl SagaStep<RegistrationContext, RegistrationError> for CreateIdentity<'_> {
    fn name(&self) -> &'static str {
        "create_identity"
    }

    async fn execute(&self, context: &mut RegistrationContext) -> Result<(), RegistrationError> {
        let input = &context.input;
        let attributes = [
            IdentityAttribute::new("email", input.email.as_str()),
            IdentityAttribute::new("name", input.name.as_str()),
        ];
        let subject = self
            .identity
            .create_account(&input.email, &input.password, &attributes)
            .await
            .map_err(RegistrationError::IdentityCreationFailed)?;

        context.subject = Some(subject);
        context.advance(RegistrationState::IdentityCreated);
        Ok(())
    }

    fn compensates(&self) -> bool {
        true
    }

    /// An account that is already gone counts as rolled back.
    async fn compensate(&self, context: &RegistrationContext) -> Result<(), RegistrationError> {
        match self.identity.delete_account(&context.input.email).await {
            Ok(()) | Err(IdentityError::NotFound) => Ok(()),
            Err(error) => Err(RegistrationError::IdentityDeletionFailed(error)),
        }
    }
}

struct TagRole<'a> {
    identity: &'a dyn IdentityProvider,
}

#[async_trait]
impl SagaStep<RegistrationContext, RegistrationError> for TagRole<'_> {
    fn name(&self) -> &'static str {
        "tag_role"
    }

    async fn execute(&self, context: &mut RegistrationContext) -> Result<(), RegistrationError> {
        let attributes = [IdentityAttribute::new(
            ROLE_ATTRIBUTE,
            context.input.role.as_str(),
        )];
        self.identity
            .set_attributes(&context.input.email, &attributes)
            .await
            .map_err(RegistrationError::IdentityUpdateFailed)?;

        context.advance(RegistrationState::RoleTagged);
        Ok(())
    }
}

struct UploadPicture<'a> {
    blobs: &'a dyn BlobStore,
}

#[async_trait]
impl SagaStep<RegistrationContext, RegistrationError> for UploadPicture<'_> {
    fn name(&self) -> &'static str {
        "upload_picture"
    }

    async fn execute(&self, context: &mut RegistrationContext) -> Result<(), RegistrationError> {
        let input = &context.input;
        let key = profile_picture_key(&input.email, &input.file_name, &input.picture_content_type);
        let url = self
            .blobs
            .put_object(&key, input.picture.clone(), &input.picture_content_type)
            .await
            .map_err(RegistrationError::ProfilePictureUploadFailed)?;

        context.profile_pic_url = Some(url);
        context.advance(RegistrationState::PictureUploaded);
        Ok(())
    }
}

struct PersistProfile<'a> {
    profiles: &'a dyn ProfileStore,
}

#[async_trait]
impl SagaStep<RegistrationContext, RegistrationError> for PersistProfile<'_> {
    fn name(&self) -> &'static str {
        "persist_profile"
    }

    async fn execute(&self, context: &mut RegistrationContext) -> Result<(), RegistrationError> {
        let input = &context.input;
        let record = ProfileRecord {
            user_id: input.email.clone(),
            name: input.name.clone(),
            profile_type: input.role,
            email: input.email.clone(),
            profile_pic_url: context.profile_pic_url.clone().unwrap_or_default(),
        };
        self.profiles
            .put_profile_if_absent(&record)
            .await
            .map_err(RegistrationError::ProfilePersistFailed)?;

        context.advance(RegistrationState::ProfilePersisted);
        Ok(())
    }
}

/// Runs registrations against injected collaborators.
pub struct RegistrationSaga<'a> {
    identity: &'a dyn IdentityProvider,
    blobs: &'a dyn BlobStore,
    profiles: &'a dyn ProfileStore,
}

impl<'a> RegistrationSaga<'a> {
    pub fn new(
        identity: &'a dyn IdentityProvider,
        blobs: &'a dyn BlobStore,
        profiles: &'a dyn ProfileStore,
    ) -> Self {
        Self {
            identity,
            blobs,
            profiles,
        }
    }

    fn saga(&self) -> Saga<'a, RegistrationContext, RegistrationError> {
        Saga::new(SAGA_NAME)
            .step(CreateIdentity {
                identity: self.identity,
            })
            .step(TagRole {
                identity: self.identity,
            })
            .step(UploadPicture { blobs: self.blobs })
            .step(PersistProfile {
                profiles: self.profiles,
            })
    }

    pub async fn register(
        &self,
        input: RegistrationInput,
    ) -> Result<RegistrationOutcome, RegistrationFailure> {
        let span = tracing::info_span!("registration", user_id = %input.email);
        let saga = self.saga();
        let mut context = RegistrationContext::new(input);

        let result = saga.run(&mut context).instrument(span.clone()).await;
        let _entered = span.enter();

        match result {
            Ok(()) => {
                let subject = context.subject.unwrap_or_default();
                info!(
                    component = "registration",
                    event = "registration_completed",
                    user_id = %context.input.email,
                    subject = %subject,
                    "user registered"
                );
                Ok(RegistrationOutcome {
                    user_id: context.input.email,
                    subject,
                    profile_pic_url: context.profile_pic_url.unwrap_or_default(),
                    history: context.history,
                })
            }
            Err(failure) => Err(RegistrationFailure {
                error: fold_failure(failure, &context.input.email),
                history: context.history,
            }),
        }
    }
}

fn fold_failure(failure: SagaFailure<RegistrationError>, email: &str) -> RegistrationError {
    let SagaFailure {
        failed_step,
        error: trigger,
        compensation_failures,
        ..
    } = failure;

    match compensation_failures.into_iter().next() {
        None => trigger,
        Some(compensation) => {
            error!(
                component = "registration",
                event = "compensation_failure",
                step = failed_step,
                user_id = email,
                trigger = %trigger,
                compensation = %compensation.error,
                manual_cleanup_required = true,
                "registration left an orphaned identity"
            );
            RegistrationError::CompensationFailed {
                step: failed_step,
                identity: email.to_string(),
                trigger: Box::new(trigger),
                compensation: Box::new(compensation.error),
            }
        }
    }
}
