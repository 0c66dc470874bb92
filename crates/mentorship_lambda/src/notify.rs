//! Invocation outcome notifications.
//!
//! Every handler response passes through [`finish_invocation`], which logs the
//! outcome and hands a [`Notification`] to the configured [`Notifier`].
//! Successes go to the channel's base name, failures to its `-alerts` sibling,
//! both suffixed with `-staging` in the staging environment.

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use mentorship_core::error::ServiceError;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::handlers::api::ApiGatewayResponse;

pub const STAGING_ENVIRONMENT: &str = "staging";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelFamily {
    Auth,
    Files,
}

impl ChannelFamily {
    pub fn base(self) -> &'static str {
        match self {
            Self::Auth => "#auth-cognito",
            Self::Files => "#s3-bucket",
        }
    }

    pub fn channel(self, success: bool, environment: &str) -> String {
        let mut channel = self.base().to_string();
        if !success {
            channel.push_str("-alerts");
        }
        if environment.eq_ignore_ascii_case(STAGING_ENVIRONMENT) {
            channel.push_str("-staging");
        }
        channel
    }
}

/// Static description of one Lambda endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    pub handler: &'static str,
    pub family: ChannelFamily,
    /// Value of `Access-Control-Allow-Methods`.
    pub methods: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Status {
    Success,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub handler: String,
    pub channel: String,
    pub message: String,
    pub level: Level,
    pub status: Status,
    pub status_code: u16,
    pub environment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: String,
}

impl Notification {
    pub fn for_outcome(
        endpoint: &Endpoint,
        environment: &str,
        status_code: u16,
        error: Option<&ServiceError>,
    ) -> Self {
        let success = (200..300).contains(&status_code) && error.is_none();
        let (message, level, status) = if success {
            (
                format!("{} executed successfully", endpoint.handler),
                Level::Info,
                Status::Success,
            )
        } else {
            (
                format!("{} execution failed", endpoint.handler),
                Level::Error,
                Status::Failure,
            )
        };

        Self {
            handler: endpoint.handler.to_string(),
            channel: endpoint.family.channel(success, environment),
            message,
            level,
            status,
            status_code,
            environment: environment.to_string(),
            error: error.map(ToString::to_string),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("notification delivery failed: {0}")]
pub struct NotifyError(pub String);

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Writes notifications to the structured log, where a log subscription can
/// forward them to chat.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        let payload = serde_json::to_string(notification)
            .map_err(|error| NotifyError(error.to_string()))?;
        match notification.level {
            Level::Info => info!(
                component = "notifier",
                event = "notification",
                channel = %notification.channel,
                notification = %payload,
                "{}",
                notification.message
            ),
            Level::Error => error!(
                component = "notifier",
                event = "notification",
                channel = %notification.channel,
                notification = %payload,
                "{}",
                notification.message
            ),
        }
        Ok(())
    }
}

/// Logs the outcome, notifies, and renders the final HTTP response with the
/// endpoint's CORS headers. A notifier failure never alters the response.
pub async fn finish_invocation(
    endpoint: &Endpoint,
    environment: &str,
    notifier: &dyn Notifier,
    outcome: Result<ApiGatewayResponse, ServiceError>,
) -> ApiGatewayResponse {
    let (response, failure) = match outcome {
        Ok(response) => (response, None),
        Err(service_error) => {
            log_failure(endpoint, &service_error);
            (ApiGatewayResponse::from_error(&service_error), Some(service_error))
        }
    };

    let notification =
        Notification::for_outcome(endpoint, environment, response.status_code, failure.as_ref());
    if let Err(notify_error) = notifier.notify(&notification).await {
        warn!(
            component = "notifier",
            event = "notification_failed",
            handler = endpoint.handler,
            error = %notify_error,
            "failed to deliver notification"
        );
    }

    response.with_cors(endpoint.methods)
}

fn log_failure(endpoint: &Endpoint, service_error: &ServiceError) {
    if service_error.requires_manual_cleanup() {
        error!(
            component = "handler",
            event = "request_failed",
            handler = endpoint.handler,
            status = service_error.status_code(),
            code = service_error.code(),
            manual_cleanup_required = true,
            error = %service_error,
            "request failed and left state requiring manual cleanup"
        );
    } else if service_error.status_code() >= 500 {
        error!(
            component = "handler",
            event = "request_failed",
            handler = endpoint.handler,
            status = service_error.status_code(),
            code = service_error.code(),
            error = %service_error,
            "request failed"
        );
    } else {
        info!(
            component = "handler",
            event = "request_rejected",
            handler = endpoint.handler,
            status = service_error.status_code(),
            code = service_error.code(),
            error = %service_error,
            "request rejected"
        );
    }
}
