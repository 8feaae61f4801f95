//! Bearer-token session validation
//!
//! `CurrentUser` is an axum extractor: a handler that takes one cannot run
//! for an unauthenticated request. The resolved identity is handed to
//! services explicitly as an owner id.

use std::sync::Arc;

use axum::{
    Json,
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::core::auth::api::ApiError;
use crate::core::auth::jwt::{JwtError, JwtService};
use crate::core::db::repositories::UserStore;

/// Session validation errors. All of them reject the request with 401.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Missing or malformed Authorization header")]
    MissingOrMalformedHeader,

    #[error("Invalid or expired token")]
    InvalidOrExpiredToken,

    #[error("User not found")]
    UserNotFound,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<JwtError> for SessionError {
    fn from(err: JwtError) -> Self {
        tracing::debug!("JWT validation failed: {}", err);
        SessionError::InvalidOrExpiredToken
    }
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            SessionError::MissingOrMalformedHeader => (StatusCode::UNAUTHORIZED, "MISSING_TOKEN"),
            SessionError::InvalidOrExpiredToken => (StatusCode::UNAUTHORIZED, "INVALID_TOKEN"),
            SessionError::UserNotFound => (StatusCode::UNAUTHORIZED, "USER_NOT_FOUND"),
            SessionError::Internal(detail) => {
                tracing::error!("Session validation failed: {}", detail);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiError::new("Internal server error", "INTERNAL_ERROR")),
                )
                    .into_response();
            }
        };

        (status, Json(ApiError::new(self.to_string(), code))).into_response()
    }
}

/// Resolves bearer tokens to users
#[derive(Clone)]
pub struct SessionValidator {
    jwt_service: JwtService,
    users: Arc<dyn UserStore>,
}

impl SessionValidator {
    pub fn new(jwt_service: JwtService, users: Arc<dyn UserStore>) -> Self {
        Self { jwt_service, users }
    }

    /// Validate a raw token and load the user its subject names
    pub async fn authenticate(&self, token: &str) -> Result<CurrentUser, SessionError> {
        let claims = self.jwt_service.validate_token(token)?;
        let user_id = claims.user_id()?;

        let user = self
            .users
            .find_by_id(user_id)
            .await
            .map_err(|e| SessionError::Internal(e.to_string()))?
            .ok_or(SessionError::UserNotFound)?;

        Ok(CurrentUser {
            id: user.id,
            username: user.username,
            email: user.email,
        })
    }
}

/// The authenticated caller of a protected route
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
    pub email: String,
}

impl<S> FromRequestParts<S> for CurrentUser
where
    SessionValidator: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = SessionError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers)?;
        let validator = SessionValidator::from_ref(state);
        validator.authenticate(token).await
    }
}

/// Extract Bearer token from Authorization header
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, SessionError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(SessionError::MissingOrMalformedHeader)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(SessionError::MissingOrMalformedHeader)?;

    if token.is_empty() {
        return Err(SessionError::MissingOrMalformedHeader);
    }

    Ok(token)
}
