//! Environment configuration injected by the infrastructure layer.
//!
//! Every function reads the same variables; each handler asks only for the
//! values it needs, so a missing variable fails exactly the functions that
//! depend on it.

use thiserror::Error;

pub const ENVIRONMENT: &str = "ENVIRONMENT";
pub const BUCKET_NAME: &str = "BUCKET_NAME";
pub const DDB_TABLE_NAME: &str = "DDB_TABLE_NAME";
pub const COGNITO_CLIENT_ID: &str = "COGNITO_CLIENT_ID";
pub const COGNITO_POOL_ARN: &str = "COGNITO_POOL_ARN";

pub const DEFAULT_ENVIRONMENT: &str = "dev";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} must be configured")]
    Missing(&'static str),

    #[error("{name} is malformed: {value}")]
    Malformed { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LambdaConfig {
    pub environment: String,
    bucket_name: Option<String>,
    table_name: Option<String>,
    client_id: Option<String>,
    pool_arn: Option<String>,
}

impl LambdaConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        Self {
            environment: read(ENVIRONMENT).unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string()),
            bucket_name: read(BUCKET_NAME),
            table_name: read(DDB_TABLE_NAME),
            client_id: read(COGNITO_CLIENT_ID),
            pool_arn: read(COGNITO_POOL_ARN),
        }
    }

    pub fn bucket_name(&self) -> Result<&str, ConfigError> {
        required(&self.bucket_name, BUCKET_NAME)
    }

    pub fn table_name(&self) -> Result<&str, ConfigError> {
        required(&self.table_name, DDB_TABLE_NAME)
    }

    pub fn client_id(&self) -> Result<&str, ConfigError> {
        required(&self.client_id, COGNITO_CLIENT_ID)
    }

    pub fn pool_arn(&self) -> Result<&str, ConfigError> {
        required(&self.pool_arn, COGNITO_POOL_ARN)
    }

    /// User pool id, the last `/`-separated segment of the pool ARN.
    pub fn user_pool_id(&self) -> Result<&str, ConfigError> {
        let arn = self.pool_arn()?;
        arn.rsplit('/')
            .next()
            .filter(|segment| !segment.is_empty() && *segment != arn)
            .ok_or_else(|| ConfigError::Malformed {
                name: COGNITO_POOL_ARN,
                value: arn.to_string(),
            })
    }

    pub fn is_staging(&self) -> bool {
        self.environment.eq_ignore_ascii_case("staging")
    }
}

fn required<'a>(value: &'a Option<String>, name: &'static str) -> Result<&'a str, ConfigError> {
    value.as_deref().ok_or(ConfigError::Missing(name))
}
