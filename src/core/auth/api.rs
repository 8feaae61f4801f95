//! Auth API endpoints
//!
//! Provides REST API endpoints for authentication:
//! - POST /auth/signup - Register a new user and send the verification email
//! - POST /auth/login - Login and get a session token
//! - GET /verify-email?token= - Redeem a verification token
//! - POST /auth/resend-verification - Issue a fresh verification token
//! - GET /user/profile - Get the current user

use axum::{
    Json, Router,
    extract::{FromRef, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::core::auth::session::{CurrentUser, SessionValidator};
use crate::core::auth::{AuthError, AuthService, LoginRequest, LoginResponse, RegisterRequest};
use crate::core::db::models::UserResponse;

/// Auth API state containing the auth service
#[derive(Clone)]
pub struct AuthApiState {
    pub auth_service: AuthService,
    pub sessions: SessionValidator,
}

impl FromRef<Arc<AuthApiState>> for SessionValidator {
    fn from_ref(state: &Arc<AuthApiState>) -> Self {
        state.sessions.clone()
    }
}

/// API error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
}

impl ApiError {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
        }
    }
}

/// Convert AuthError to API response
impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AuthError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            AuthError::InvalidUsername => (StatusCode::BAD_REQUEST, "INVALID_USERNAME"),
            AuthError::InvalidEmail => (StatusCode::BAD_REQUEST, "INVALID_EMAIL"),
            AuthError::PasswordTooShort => (StatusCode::BAD_REQUEST, "PASSWORD_TOO_SHORT"),
            AuthError::PasswordTooLong => (StatusCode::BAD_REQUEST, "PASSWORD_TOO_LONG"),
            AuthError::DuplicateUsername => (StatusCode::BAD_REQUEST, "USERNAME_EXISTS"),
            AuthError::DuplicateEmail => (StatusCode::BAD_REQUEST, "EMAIL_EXISTS"),
            AuthError::UserNotFound => (StatusCode::NOT_FOUND, "USER_NOT_FOUND"),
            AuthError::EmailNotVerified => (StatusCode::UNAUTHORIZED, "EMAIL_NOT_VERIFIED"),
            AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
            AuthError::InvalidOrExpiredToken => (StatusCode::BAD_REQUEST, "INVALID_TOKEN"),
            AuthError::AlreadyVerified => (StatusCode::BAD_REQUEST, "ALREADY_VERIFIED"),
            AuthError::VerificationDispatchFailed => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "VERIFICATION_DISPATCH_FAILED",
            ),
            AuthError::InternalError(detail) => {
                tracing::error!("Auth request failed: {}", detail);
                let body = ApiError::new("Internal server error", "INTERNAL_ERROR");
                return (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
            }
        };

        let body = ApiError::new(self.to_string(), code);

        (status, Json(body)).into_response()
    }
}

/// Generic message response
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Response for signup
#[derive(Debug, Serialize, Deserialize)]
pub struct SignupResponse {
    pub message: String,
    pub user_id: i64,
}

/// Request for resending the verification email
#[derive(Debug, Deserialize)]
pub struct ResendRequest {
    pub email: String,
}

/// Query of the verification link
#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    #[serde(default)]
    pub token: String,
}

/// Response for the profile endpoint
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user: UserResponse,
}

/// Create the auth API router
pub fn auth_api_router(state: AuthApiState) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route("/auth/signup", post(signup_handler))
        .route("/auth/login", post(login_handler))
        .route("/verify-email", get(verify_email_handler))
        .route("/auth/resend-verification", post(resend_handler))
        .route("/user/profile", get(profile_handler))
        .with_state(state)
}

fn json_error(rejection: JsonRejection) -> AuthError {
    AuthError::InvalidRequest(rejection.body_text())
}

/// POST /auth/signup
/// Register a new user
async fn signup_handler(
    State(state): State<Arc<AuthApiState>>,
    request: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<SignupResponse>, AuthError> {
    let Json(request) = request.map_err(json_error)?;
    tracing::info!("Registration attempt for email: {}", request.email);

    let user_id = state.auth_service.register(request).await?;

    tracing::info!("User registered successfully: {}", user_id);

    Ok(Json(SignupResponse {
        message: "Account created. Please check your email to verify your account.".to_string(),
        user_id,
    }))
}

/// POST /auth/login
/// Login and get a session token
async fn login_handler(
    State(state): State<Arc<AuthApiState>>,
    request: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AuthError> {
    let Json(request) = request.map_err(json_error)?;
    tracing::info!("Login attempt for: {}", request.username_or_email);

    let response = state.auth_service.login(request).await?;

    tracing::info!("User logged in successfully: {}", response.user.id);

    Ok(Json(response))
}

/// GET /verify-email?token=
async fn verify_email_handler(
    State(state): State<Arc<AuthApiState>>,
    Query(query): Query<VerifyQuery>,
) -> Result<Json<MessageResponse>, AuthError> {
    state.auth_service.verify_email(&query.token).await?;

    Ok(Json(MessageResponse::new(
        "Email verified successfully. You can now log in.",
    )))
}

/// POST /auth/resend-verification
async fn resend_handler(
    State(state): State<Arc<AuthApiState>>,
    request: Result<Json<ResendRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, AuthError> {
    let Json(request) = request.map_err(json_error)?;
    tracing::info!("Verification resend requested for: {}", request.email);

    state
        .auth_service
        .resend_verification(&request.email)
        .await?;

    Ok(Json(MessageResponse::new(
        "Verification email sent. Please check your inbox.",
    )))
}

/// GET /user/profile
async fn profile_handler(
    State(state): State<Arc<AuthApiState>>,
    current_user: CurrentUser,
) -> Result<Json<ProfileResponse>, AuthError> {
    let user = state.auth_service.profile(current_user.id).await?;

    Ok(Json(ProfileResponse { user }))
}
