//! Bearer token authentication for the user-service routes

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use uuid::Uuid;

use super::error::ApiError;
use crate::auth::TokenIssuer;

/// The caller identified by a valid `Authorization: Bearer` token
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    value.split_whitespace().nth(1)
}

impl<S> FromRequestParts<S> for AuthUser
where
    TokenIssuer: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts) else {
            log::info!("No token provided for request: {}", parts.uri);
            return Err(ApiError::Unauthorized("No token provided".to_string()));
        };

        let issuer = TokenIssuer::from_ref(state);
        match issuer.verify_session(token) {
            Ok(claims) => Ok(AuthUser {
                user_id: claims.user_id,
                email: claims.email,
            }),
            Err(e) => {
                log::warn!("Token verification error: {}", e);
                Err(ApiError::Unauthorized("Invalid token".to_string()))
            }
        }
    }
}
