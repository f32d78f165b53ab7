//! Extractors resolving the caller from an `Authorization: Bearer` header.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use services::services::identity::{CurrentClient, IdentityError};

use crate::{DeploymentImpl, error::ApiError};

/// Any authenticated client.
#[derive(Debug, Clone)]
pub struct AuthClient(pub CurrentClient);

/// An authenticated client holding the admin role.
#[derive(Debug, Clone)]
pub struct AdminClient(pub CurrentClient);

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    scheme.eq_ignore_ascii_case("bearer").then_some(token.trim())
}

impl FromRequestParts<DeploymentImpl> for AuthClient {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        deployment: &DeploymentImpl,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(IdentityError::MissingToken)?;
        let client = deployment.identity().verify(token)?;
        Ok(AuthClient(client))
    }
}

impl FromRequestParts<DeploymentImpl> for AdminClient {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        deployment: &DeploymentImpl,
    ) -> Result<Self, Self::Rejection> {
        let AuthClient(client) = AuthClient::from_request_parts(parts, deployment).await?;
        if !client.is_admin() {
            return Err(ApiError::Forbidden);
        }
        Ok(AdminClient(client))
    }
}
