//! AWS-oriented adapters and handlers for the mentorship backend.
//!
//! This crate owns runtime integration details (Lambda handlers, collaborator
//! ports and their AWS implementations, the registration saga) and builds on
//! the pure contracts in `mentorship_core`.

pub mod adapters;
pub mod aws;
pub mod config;
pub mod handlers;
pub mod logging;
pub mod notify;
pub mod registration;
pub mod runtime;
pub mod saga;

#[cfg(test)]
pub(crate) mod test_support;
