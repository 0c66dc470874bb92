//! Shared mentorship backend domain primitives.
//!
//! This crate owns request/response contracts, field validation, content-type
//! inference, multipart decoding, and the error taxonomy shared by every
//! endpoint. It intentionally excludes AWS SDK and Lambda runtime concerns.

pub mod content_type;
pub mod contract;
pub mod error;
pub mod multipart;
pub mod storage_keys;
pub mod token;
pub mod validation;
