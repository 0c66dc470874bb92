use std::future::Future;

use mentorship_core::error::ServiceError;
use serde_json::Value;

use crate::notify::{finish_invocation, Endpoint, Notifier};

pub mod api;
pub mod confirm;
pub mod delete;
pub mod download;
pub mod list;
pub mod login;
pub mod me;
pub mod register;
pub mod resend;
pub mod upload;

use api::{ApiGatewayRequest, ApiGatewayResponse};

/// Decodes a raw proxy event, runs `handler` on it, and finishes the
/// invocation through the notification wrapper.
pub async fn dispatch<F, Fut>(
    endpoint: &Endpoint,
    environment: &str,
    notifier: &dyn Notifier,
    event: Value,
    handler: F,
) -> ApiGatewayResponse
where
    F: FnOnce(ApiGatewayRequest) -> Fut,
    Fut: Future<Output = Result<ApiGatewayResponse, ServiceError>>,
{
    let outcome = match ApiGatewayRequest::from_event(event) {
        Ok(request) => handler(request).await,
        Err(error) => Err(error),
    };
    finish_invocation(endpoint, environment, notifier, outcome).await
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::notify::{ChannelFamily, LogNotifier};

    const PING: Endpoint = Endpoint {
        handler: "PingHandler",
        family: ChannelFamily::Auth,
        methods: "GET, OPTIONS",
    };

    #[tokio::test]
    async fn malformed_events_never_reach_the_handler() {
        let response = dispatch(&PING, "dev", &LogNotifier, json!(42), |_request| async {
            Ok(ApiGatewayResponse::text(200, "text/plain", "ran".to_string()))
        })
        .await;

        assert_eq!(response.status_code, 400);
        assert_eq!(response.header("Access-Control-Allow-Origin"), Some("*"));
    }

    #[tokio::test]
    async fn handler_output_is_wrapped_with_cors() {
        let response = dispatch(&PING, "dev", &LogNotifier, json!({}), |_request| async {
            ApiGatewayResponse::json(200, &json!({"message": "pong"}))
        })
        .await;

        assert_eq!(response.status_code, 200);
        assert_eq!(response.header("Access-Control-Allow-Methods"), Some("GET, OPTIONS"));
    }
}
