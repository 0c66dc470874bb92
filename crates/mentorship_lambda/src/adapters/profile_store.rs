use async_trait::async_trait;
use mentorship_core::contract::{ProfileRecord, Role};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileStoreError {
    /// The conditional write found a record already stored under the key.
    #[error("profile already exists")]
    ConditionFailed,

    #[error("profile store fault: {0}")]
    Fault(String),
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Inserts `record` only if no record exists for its `UserId`.
    async fn put_profile_if_absent(&self, record: &ProfileRecord) -> Result<(), ProfileStoreError>;

    async fn get_profile(
        &self,
        user_id: &str,
        profile_type: Role,
    ) -> Result<Option<ProfileRecord>, ProfileStoreError>;
}
