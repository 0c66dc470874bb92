use std::fmt::Display;

use thiserror::Error;

pub const GENERIC_SERVER_MESSAGE: &str = "Internal server error";

/// Error taxonomy shared by the registration saga and the file transfer
/// handlers. Every variant maps to exactly one HTTP status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{context}: {detail}")]
    UpstreamFault { context: String, detail: String },

    /// A saga step failed and the rollback of earlier steps failed as well.
    /// The identity named here is orphaned until someone removes it by hand.
    #[error("{step} failed for {identity}: {trigger}; compensation failed: {compensation}")]
    CompensationFailure {
        step: String,
        identity: String,
        trigger: String,
        compensation: String,
    },
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn upstream(context: impl Into<String>, detail: impl Display) -> Self {
        Self::UpstreamFault {
            context: context.into(),
            detail: detail.to_string(),
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Unauthorized(_) => 401,
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::UpstreamFault { .. } | Self::CompensationFailure { .. } => 500,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::Unauthorized(_) => "unauthorized",
            Self::UpstreamFault { .. } => "upstream_fault",
            Self::CompensationFailure { .. } => "compensation_failure",
        }
    }

    /// Message safe to return to the HTTP caller. Server-side faults never
    /// leak their internal detail.
    pub fn public_message(&self) -> String {
        match self {
            Self::Validation(message)
            | Self::NotFound(message)
            | Self::Conflict(message)
            | Self::Unauthorized(message) => message.clone(),
            Self::UpstreamFault { .. } | Self::CompensationFailure { .. } => {
                GENERIC_SERVER_MESSAGE.to_string()
            }
        }
    }

    pub fn requires_manual_cleanup(&self) -> bool {
        matches!(self, Self::CompensationFailure { .. })
    }
}
