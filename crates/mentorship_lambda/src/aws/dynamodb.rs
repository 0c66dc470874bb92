use std::collections::HashMap;
use std::error::Error as StdError;

use async_trait::async_trait;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::operation::transact_write_items::TransactWriteItemsError;
use aws_sdk_dynamodb::types::{AttributeValue, CancellationReason, Put, TransactWriteItem};
use aws_sdk_dynamodb::Client;
use mentorship_core::contract::{ProfileRecord, Role};

use crate::adapters::profile_store::{ProfileStore, ProfileStoreError};

pub const PARTITION_KEY: &str = "UserId";
pub const SORT_KEY: &str = "ProfileType";
/// Sort key of the item that claims a `UserId` for exactly one profile.
pub const USER_GUARD_SORT_KEY: &str = "#user";
const ABSENT_ITEM_CONDITION: &str = "attribute_not_exists(UserId)";
const CONDITIONAL_CHECK_FAILED: &str = "ConditionalCheckFailed";

#[derive(Clone)]
pub struct DynamoProfileStore {
    client: Client,
    table_name: String,
}

impl DynamoProfileStore {
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }
}

fn fault<E: StdError>(context: &str, error: E) -> ProfileStoreError {
    ProfileStoreError::Fault(format!("{context}: {}", DisplayErrorContext(error)))
}

pub fn record_to_item(record: &ProfileRecord) -> HashMap<String, AttributeValue> {
    HashMap::from([
        (PARTITION_KEY.to_string(), AttributeValue::S(record.user_id.clone())),
        ("Name".to_string(), AttributeValue::S(record.name.clone())),
        (
            SORT_KEY.to_string(),
            AttributeValue::S(record.profile_type.as_str().to_string()),
        ),
        ("Email".to_string(), AttributeValue::S(record.email.clone())),
        (
            "ProfilePicURL".to_string(),
            AttributeValue::S(record.profile_pic_url.clone()),
        ),
    ])
}

/// The table is keyed by (`UserId`, `ProfileType`), so a condition on the
/// profile item alone would let one user hold a mentor and a mentee profile.
/// Writing this item in the same transaction makes the `UserId` unique.
pub fn user_guard_item(user_id: &str) -> HashMap<String, AttributeValue> {
    HashMap::from([
        (PARTITION_KEY.to_string(), AttributeValue::S(user_id.to_string())),
        (
            SORT_KEY.to_string(),
            AttributeValue::S(USER_GUARD_SORT_KEY.to_string()),
        ),
    ])
}

fn is_condition_failure(reasons: &[CancellationReason]) -> bool {
    reasons
        .iter()
        .any(|reason| reason.code() == Some(CONDITIONAL_CHECK_FAILED))
}

pub fn item_to_record(
    item: &HashMap<String, AttributeValue>,
) -> Result<ProfileRecord, ProfileStoreError> {
    let text = |name: &str| {
        item.get(name)
            .and_then(|value| value.as_s().ok())
            .cloned()
            .unwrap_or_default()
    };

    let profile_type = Role::parse(&text(SORT_KEY)).ok_or_else(|| {
        ProfileStoreError::Fault(format!("stored {SORT_KEY} is not a known role"))
    })?;

    Ok(ProfileRecord {
        user_id: text(PARTITION_KEY),
        name: text("Name"),
        profile_type,
        email: text("Email"),
        profile_pic_url: text("ProfilePicURL"),
    })
}

#[async_trait]
impl ProfileStore for DynamoProfileStore {
    async fn put_profile_if_absent(&self, record: &ProfileRecord) -> Result<(), ProfileStoreError> {
        let conditional_put = |item: HashMap<String, AttributeValue>| {
            Put::builder()
                .table_name(&self.table_name)
                .set_item(Some(item))
                .condition_expression(ABSENT_ITEM_CONDITION)
                .build()
                .map(|put| TransactWriteItem::builder().put(put).build())
                .map_err(|error| fault("failed to build profile write", error))
        };

        self.client
            .transact_write_items()
            .transact_items(conditional_put(user_guard_item(&record.user_id))?)
            .transact_items(conditional_put(record_to_item(record))?)
            .send()
            .await
            .map(|_| ())
            .map_err(|error| match error.as_service_error() {
                Some(TransactWriteItemsError::TransactionCanceledException(canceled))
                    if is_condition_failure(canceled.cancellation_reasons()) =>
                {
                    ProfileStoreError::ConditionFailed
                }
                _ => fault("failed to write profile", error),
            })
    }

    async fn get_profile(
        &self,
        user_id: &str,
        profile_type: Role,
    ) -> Result<Option<ProfileRecord>, ProfileStoreError> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key(PARTITION_KEY, AttributeValue::S(user_id.to_string()))
            .key(SORT_KEY, AttributeValue::S(profile_type.as_str().to_string()))
            .send()
            .await
            .map_err(|error| fault("failed to read profile", error))?;

        output.item().map(item_to_record).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_round_trip_keeps_table_attribute_names() {
        let record = ProfileRecord {
            user_id: "jo@example.com".to_string(),
            name: "Jo".to_string(),
            profile_type: Role::Mentee,
            email: "jo@example.com".to_string(),
            profile_pic_url: "https://b.s3.amazonaws.com/profile_pictures/jo@example.com.png"
                .to_string(),
        };

        let item = record_to_item(&record);
        assert_eq!(
            item.get("ProfileType"),
            Some(&AttributeValue::S("mentee".to_string()))
        );
        assert_eq!(item_to_record(&item), Ok(record));
    }

    #[test]
    fn guard_item_claims_the_user_id_outside_role_values() {
        let guard = user_guard_item("jo@example.com");
        assert_eq!(
            guard.get(PARTITION_KEY),
            Some(&AttributeValue::S("jo@example.com".to_string()))
        );
        assert_eq!(
            guard.get(SORT_KEY),
            Some(&AttributeValue::S(USER_GUARD_SORT_KEY.to_string()))
        );
        assert!(Role::parse(USER_GUARD_SORT_KEY).is_none());
    }

    #[test]
    fn only_conditional_check_cancellations_are_conflicts() {
        let none = CancellationReason::builder().code("None").build();
        let conflict = CancellationReason::builder()
            .code(CONDITIONAL_CHECK_FAILED)
            .message("The conditional request failed")
            .build();
        let throttled = CancellationReason::builder().code("ThrottlingError").build();

        assert!(is_condition_failure(&[conflict, none.clone()]));
        assert!(!is_condition_failure(&[none, throttled]));
        assert!(!is_condition_failure(&[]));
    }

    #[test]
    fn unknown_role_in_table_is_a_fault() {
        let item = HashMap::from([
            (PARTITION_KEY.to_string(), AttributeValue::S("a@b.co".to_string())),
            (SORT_KEY.to_string(), AttributeValue::S("admin".to_string())),
        ]);
        assert!(matches!(item_to_record(&item), Err(ProfileStoreError::Fault(_))));
    }
}
