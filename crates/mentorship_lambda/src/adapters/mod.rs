pub mod blob_store;
pub mod identity_provider;
pub mod profile_store;
