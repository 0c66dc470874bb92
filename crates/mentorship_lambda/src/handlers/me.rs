use mentorship_core::contract::Role;
use mentorship_core::error::ServiceError;
use mentorship_core::token::{decode_id_token, parse_bearer_token};
use mentorship_core::validation::validate_email;

use crate::adapters::profile_store::ProfileStore;
use crate::handlers::api::{ApiGatewayRequest, ApiGatewayResponse};
use crate::notify::{ChannelFamily, Endpoint};

pub const ENDPOINT: Endpoint = Endpoint {
    handler: "MeHandler",
    family: ChannelFamily::Auth,
    methods: "GET, OPTIONS",
};

/// Returns the caller's profile. The ID token's signature is checked by the
/// gateway authorizer, so only its payload is decoded here.
pub async fn me(
    request: &ApiGatewayRequest,
    profiles: &dyn ProfileStore,
) -> Result<ApiGatewayResponse, ServiceError> {
    let token = parse_bearer_token(request.header("authorization"))?;
    let claims = decode_id_token(token)?;

    validate_email(&claims.email).map_err(|_| ServiceError::validation("Invalid email format"))?;
    if claims.custom_role.is_empty() {
        return Err(ServiceError::validation(
            "ProfileType (custom:role) is missing in the token",
        ));
    }
    let role = Role::parse(&claims.custom_role)
        .ok_or_else(|| ServiceError::validation("ProfileType (custom:role) is not a known role"))?;

    let record = profiles
        .get_profile(&claims.email, role)
        .await
        .map_err(|error| ServiceError::upstream("failed to fetch user profile", error))?
        .ok_or_else(|| ServiceError::not_found("User profile not found"))?;

    ApiGatewayResponse::json(200, &record)
}
