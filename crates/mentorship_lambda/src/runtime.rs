//! Per-process wiring shared by the Lambda binaries.
//!
//! The AWS configuration is loaded once at cold start; each binary then asks
//! for the collaborators it uses and fails initialization if their settings
//! are missing.

use aws_config::{BehaviorVersion, SdkConfig};
use tracing::info;

use crate::aws::cognito::CognitoIdentityProvider;
use crate::aws::dynamodb::DynamoProfileStore;
use crate::aws::s3::S3BlobStore;
use crate::config::{ConfigError, LambdaConfig};
use crate::logging::init_logging;
use crate::notify::{Endpoint, LogNotifier};

pub struct LambdaRuntime {
    pub config: LambdaConfig,
    pub notifier: LogNotifier,
    sdk_config: SdkConfig,
}

impl LambdaRuntime {
    pub async fn load(endpoint: &Endpoint) -> Result<Self, lambda_runtime::Error> {
        init_logging()?;
        let config = LambdaConfig::from_env();
        let sdk_config = aws_config::load_defaults(BehaviorVersion::latest()).await;

        info!(
            component = "runtime",
            event = "cold_start",
            handler = endpoint.handler,
            environment = %config.environment,
            staging = config.is_staging(),
            "lambda runtime initialized"
        );

        Ok(Self {
            config,
            notifier: LogNotifier,
            sdk_config,
        })
    }

    pub fn environment(&self) -> &str {
        &self.config.environment
    }

    pub fn identity_provider(&self) -> Result<CognitoIdentityProvider, ConfigError> {
        Ok(CognitoIdentityProvider::new(
            aws_sdk_cognitoidentityprovider::Client::new(&self.sdk_config),
            self.config.client_id()?,
            self.config.user_pool_id()?,
        ))
    }

    pub fn blob_store(&self) -> Result<S3BlobStore, ConfigError> {
        Ok(S3BlobStore::new(
            aws_sdk_s3::Client::new(&self.sdk_config),
            self.config.bucket_name()?,
        ))
    }

    pub fn profile_store(&self) -> Result<DynamoProfileStore, ConfigError> {
        Ok(DynamoProfileStore::new(
            aws_sdk_dynamodb::Client::new(&self.sdk_config),
            self.config.table_name()?,
        ))
    }
}
