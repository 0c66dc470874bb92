//! In-memory collaborators with per-operation fault injection.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use mentorship_core::contract::{FileEntry, ProfileRecord, Role};
use mentorship_core::storage_keys::public_object_url;

use crate::adapters::blob_store::{BlobStore, BlobStoreError, ObjectPage, StoredObject};
use crate::adapters::identity_provider::{
    AuthTokens, Identity, IdentityAttribute, IdentityError, IdentityProvider,
};
use crate::adapters::profile_store::{ProfileStore, ProfileStoreError};

pub const VALID_CODE: &str = "123456";
pub const EXPIRED_CODE: &str = "000000";
pub const TEST_BUCKET: &str = "test-bucket";

struct Faults<E> {
    by_operation: Mutex<HashMap<&'static str, E>>,
}

impl<E: Clone> Faults<E> {
    fn new() -> Self {
        Self {
            by_operation: Mutex::new(HashMap::new()),
        }
    }

    fn inject(&self, operation: &'static str, error: E) {
        self.by_operation
            .lock()
            .expect("poisoned mutex")
            .insert(operation, error);
    }

    fn check(&self, operation: &'static str) -> Result<(), E> {
        match self
            .by_operation
            .lock()
            .expect("poisoned mutex")
            .get(operation)
        {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone)]
struct Account {
    password: String,
    attributes: BTreeMap<String, String>,
    confirmed: bool,
}

pub struct InMemoryIdentityProvider {
    accounts: Mutex<HashMap<String, Account>>,
    calls: Mutex<Vec<String>>,
    faults: Faults<IdentityError>,
}

impl InMemoryIdentityProvider {
    pub fn new() -> Self {
        Self {
            accounts: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            faults: Faults::new(),
        }
    }

    pub fn failing(self, operation: &'static str, error: IdentityError) -> Self {
        self.faults.inject(operation, error);
        self
    }

    pub fn with_account(self, email: &str, password: &str, confirmed: bool) -> Self {
        self.accounts.lock().expect("poisoned mutex").insert(
            email.to_string(),
            Account {
                password: password.to_string(),
                attributes: BTreeMap::from([
                    ("email".to_string(), email.to_string()),
                    ("name".to_string(), "Existing".to_string()),
                ]),
                confirmed,
            },
        );
        self
    }

    pub fn exists(&self, email: &str) -> bool {
        self.accounts
            .lock()
            .expect("poisoned mutex")
            .contains_key(email)
    }

    pub fn account_count(&self) -> usize {
        self.accounts.lock().expect("poisoned mutex").len()
    }

    pub fn attribute(&self, email: &str, name: &str) -> Option<String> {
        self.accounts
            .lock()
            .expect("poisoned mutex")
            .get(email)
            .and_then(|account| account.attributes.get(name).cloned())
    }

    pub fn is_confirmed(&self, email: &str) -> bool {
        self.accounts
            .lock()
            .expect("poisoned mutex")
            .get(email)
            .map(|account| account.confirmed)
            .unwrap_or(false)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("poisoned mutex").clone()
    }

    fn record(&self, operation: &'static str, email: &str) -> Result<(), IdentityError> {
        self.calls
            .lock()
            .expect("poisoned mutex")
            .push(format!("{operation}:{email}"));
        self.faults.check(operation)
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn create_account(
        &self,
        email: &str,
        password: &str,
        attributes: &[IdentityAttribute],
    ) -> Result<String, IdentityError> {
        self.record("create_account", email)?;
        let mut accounts = self.accounts.lock().expect("poisoned mutex");
        if accounts.contains_key(email) {
            return Err(IdentityError::AlreadyExists);
        }
        accounts.insert(
            email.to_string(),
            Account {
                password: password.to_string(),
                attributes: attributes
                    .iter()
                    .map(|attribute| (attribute.name.clone(), attribute.value.clone()))
                    .collect(),
                confirmed: false,
            },
        );
        Ok(format!("sub-{email}"))
    }

    async fn set_attributes(
        &self,
        email: &str,
        attributes: &[IdentityAttribute],
    ) -> Result<(), IdentityError> {
        self.record("set_attributes", email)?;
        let mut accounts = self.accounts.lock().expect("poisoned mutex");
        let account = accounts.get_mut(email).ok_or(IdentityError::NotFound)?;
        for attribute in attributes {
            account
                .attributes
                .insert(attribute.name.clone(), attribute.value.clone());
        }
        Ok(())
    }

    async fn delete_account(&self, email: &str) -> Result<(), IdentityError> {
        self.record("delete_account", email)?;
        self.accounts
            .lock()
            .expect("poisoned mutex")
            .remove(email)
            .map(|_| ())
            .ok_or(IdentityError::NotFound)
    }

    async fn describe_account(&self, email: &str) -> Result<Identity, IdentityError> {
        self.record("describe_account", email)?;
        let accounts = self.accounts.lock().expect("poisoned mutex");
        let account = accounts.get(email).ok_or(IdentityError::NotFound)?;
        Ok(Identity {
            email: email.to_string(),
            name: account.attributes.get("name").cloned().unwrap_or_default(),
            custom_role: account.attributes.get("custom:role").cloned(),
            email_verified: account.confirmed,
        })
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthTokens, IdentityError> {
        self.record("sign_in", email)?;
        let accounts = self.accounts.lock().expect("poisoned mutex");
        let account = accounts.get(email).ok_or(IdentityError::NotFound)?;
        if account.password != password {
            return Err(IdentityError::InvalidCredentials);
        }
        Ok(AuthTokens {
            access_token: format!("access-{email}"),
            id_token: Some(format!("id-{email}")),
            refresh_token: None,
        })
    }

    async fn confirm_account(&self, email: &str, code: &str) -> Result<(), IdentityError> {
        self.record("confirm_account", email)?;
        let mut accounts = self.accounts.lock().expect("poisoned mutex");
        let account = accounts.get_mut(email).ok_or(IdentityError::NotFound)?;
        match code {
            VALID_CODE => {
                account.confirmed = true;
                Ok(())
            }
            EXPIRED_CODE => Err(IdentityError::ExpiredCode),
            _ => Err(IdentityError::InvalidCode),
        }
    }

    async fn resend_confirmation(&self, email: &str) -> Result<(), IdentityError> {
        self.record("resend_confirmation", email)?;
        if self.exists(email) {
            Ok(())
        } else {
            Err(IdentityError::NotFound)
        }
    }
}

pub struct InMemoryBlobStore {
    objects: Mutex<BTreeMap<String, StoredObject>>,
    page_size: usize,
    put_calls: Mutex<usize>,
    list_calls: Mutex<usize>,
    faults: Faults<BlobStoreError>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::with_page_size(1_000)
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            objects: Mutex::new(BTreeMap::new()),
            page_size: page_size.max(1),
            put_calls: Mutex::new(0),
            list_calls: Mutex::new(0),
            faults: Faults::new(),
        }
    }

    pub fn failing(self, operation: &'static str, error: BlobStoreError) -> Self {
        self.faults.inject(operation, error);
        self
    }

    pub fn seed_object(&self, key: &str, bytes: &[u8], content_type: Option<&str>) {
        self.objects.lock().expect("poisoned mutex").insert(
            key.to_string(),
            StoredObject {
                bytes: bytes.to_vec(),
                content_type: content_type.map(str::to_string),
            },
        );
    }

    pub fn object(&self, key: &str) -> Option<StoredObject> {
        self.objects.lock().expect("poisoned mutex").get(key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects
            .lock()
            .expect("poisoned mutex")
            .keys()
            .cloned()
            .collect()
    }

    pub fn put_calls(&self) -> usize {
        *self.put_calls.lock().expect("poisoned mutex")
    }

    pub fn list_calls(&self) -> usize {
        *self.list_calls.lock().expect("poisoned mutex")
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn put_object(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, BlobStoreError> {
        *self.put_calls.lock().expect("poisoned mutex") += 1;
        self.faults.check("put_object")?;
        self.objects.lock().expect("poisoned mutex").insert(
            key.to_string(),
            StoredObject {
                bytes,
                content_type: Some(content_type.to_string()),
            },
        );
        Ok(self.object_url(key))
    }

    async fn get_object(&self, key: &str) -> Result<StoredObject, BlobStoreError> {
        self.faults.check("get_object")?;
        self.object(key).ok_or(BlobStoreError::NoSuchKey)
    }

    async fn list_objects(
        &self,
        continuation_token: Option<&str>,
    ) -> Result<ObjectPage, BlobStoreError> {
        *self.list_calls.lock().expect("poisoned mutex") += 1;
        self.faults.check("list_objects")?;

        let objects = self.objects.lock().expect("poisoned mutex");
        let remaining: Vec<(&String, &StoredObject)> = objects
            .iter()
            .filter(|(key, _)| match continuation_token {
                Some(token) => key.as_str() > token,
                None => true,
            })
            .collect();

        let items: Vec<FileEntry> = remaining
            .iter()
            .take(self.page_size)
            .map(|(key, object)| FileEntry {
                key: (*key).clone(),
                size: object.bytes.len() as i64,
            })
            .collect();
        let next_token = if remaining.len() > self.page_size {
            items.last().map(|entry| entry.key.clone())
        } else {
            None
        };

        Ok(ObjectPage { items, next_token })
    }

    async fn delete_object(&self, key: &str) -> Result<(), BlobStoreError> {
        self.faults.check("delete_object")?;
        self.objects
            .lock()
            .expect("poisoned mutex")
            .remove(key)
            .map(|_| ())
            .ok_or(BlobStoreError::NoSuchKey)
    }

    fn object_url(&self, key: &str) -> String {
        public_object_url(TEST_BUCKET, key)
    }
}

/// Keyed like the table, by (`UserId`, `ProfileType`). Inserts are rejected
/// when any record already exists for the `UserId`, matching the guard item
/// `DynamoProfileStore` writes.
pub struct InMemoryProfileStore {
    records: Mutex<HashMap<(String, Role), ProfileRecord>>,
    faults: Faults<ProfileStoreError>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            faults: Faults::new(),
        }
    }

    pub fn failing(self, operation: &'static str, error: ProfileStoreError) -> Self {
        self.faults.inject(operation, error);
        self
    }

    pub fn with_record(self, record: ProfileRecord) -> Self {
        self.records
            .lock()
            .expect("poisoned mutex")
            .insert((record.user_id.clone(), record.profile_type), record);
        self
    }

    pub fn record(&self, user_id: &str) -> Option<ProfileRecord> {
        self.records
            .lock()
            .expect("poisoned mutex")
            .values()
            .find(|record| record.user_id == user_id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.records.lock().expect("poisoned mutex").len()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn put_profile_if_absent(&self, record: &ProfileRecord) -> Result<(), ProfileStoreError> {
        self.faults.check("put_profile_if_absent")?;
        let mut records = self.records.lock().expect("poisoned mutex");
        if records.keys().any(|(user_id, _)| *user_id == record.user_id) {
            return Err(ProfileStoreError::ConditionFailed);
        }
        records.insert(
            (record.user_id.clone(), record.profile_type),
            record.clone(),
        );
        Ok(())
    }

    async fn get_profile(
        &self,
        user_id: &str,
        profile_type: Role,
    ) -> Result<Option<ProfileRecord>, ProfileStoreError> {
        self.faults.check("get_profile")?;
        Ok(self
            .records
            .lock()
            .expect("poisoned mutex")
            .get(&(user_id.to_string(), profile_type))
            .cloned())
    }
}
