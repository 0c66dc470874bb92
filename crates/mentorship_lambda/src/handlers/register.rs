use mentorship_core::contract::{RegistrationRequest, RegistrationResponse};
use mentorship_core::error::ServiceError;

use crate::handlers::api::{ApiGatewayRequest, ApiGatewayResponse, FILE_CONTENT_TYPE_HEADER};
use crate::notify::{ChannelFamily, Endpoint};
use crate::registration::{RegistrationInput, RegistrationSaga};

pub const ENDPOINT: Endpoint = Endpoint {
    handler: "RegisterHandler",
    family: ChannelFamily::Auth,
    methods: "POST, OPTIONS",
};

pub async fn register(
    request: &ApiGatewayRequest,
    saga: &RegistrationSaga<'_>,
) -> Result<ApiGatewayResponse, ServiceError> {
    let body: RegistrationRequest = request.json_body()?;
    let input = RegistrationInput::from_request(body, request.header(FILE_CONTENT_TYPE_HEADER))?;
    let outcome = saga.register(input).await?;

    ApiGatewayResponse::json(
        201,
        &RegistrationResponse {
            message: "User registered successfully".to_string(),
            user_id: outcome.user_id,
            profile_pic_url: outcome.profile_pic_url,
        },
    )
}
