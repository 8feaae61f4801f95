//! Authentication service
//!
//! Provides business logic for registration, email verification and login.
//! Coordinates between the user store, the verification service and the JWT service.

use std::sync::Arc;

use crate::core::auth::jwt::{JwtError, JwtService};
use crate::core::auth::password::{
    MAX_PASSWORD_BYTES, PasswordError, hash_password, verify_password,
};
use crate::core::auth::verification::{VerificationError, VerificationService};
use crate::core::db::models::{NewUser, PublicUser, User, UserResponse};
use crate::core::db::repositories::{UserRepositoryError, UserStore};

const MIN_PASSWORD_LEN: usize = 8;
const MIN_USERNAME_LEN: usize = 3;
const MAX_USERNAME_LEN: usize = 50;

/// Authentication service error types
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid request body: {0}")]
    InvalidRequest(String),

    #[error("Invalid username format")]
    InvalidUsername,

    #[error("Invalid email format")]
    InvalidEmail,

    #[error("Password too short (minimum 8 characters)")]
    PasswordTooShort,

    #[error("Password too long (maximum 72 bytes)")]
    PasswordTooLong,

    #[error("Username already taken")]
    DuplicateUsername,

    #[error("Email already registered")]
    DuplicateEmail,

    #[error("User not found")]
    UserNotFound,

    #[error("Please verify your email before logging in")]
    EmailNotVerified,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid or expired verification token")]
    InvalidOrExpiredToken,

    #[error("Email already verified")]
    AlreadyVerified,

    #[error("Account created but the verification email could not be sent; request a new one")]
    VerificationDispatchFailed,

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<UserRepositoryError> for AuthError {
    fn from(err: UserRepositoryError) -> Self {
        match err {
            UserRepositoryError::UsernameAlreadyExists => AuthError::DuplicateUsername,
            UserRepositoryError::EmailAlreadyExists => AuthError::DuplicateEmail,
            UserRepositoryError::DatabaseError(_) => AuthError::InternalError(err.to_string()),
        }
    }
}

impl From<PasswordError> for AuthError {
    fn from(err: PasswordError) -> Self {
        AuthError::InternalError(err.to_string())
    }
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        AuthError::InternalError(err.to_string())
    }
}

impl From<VerificationError> for AuthError {
    fn from(err: VerificationError) -> Self {
        AuthError::InternalError(err.to_string())
    }
}

/// Registration request data
#[derive(Debug, Clone, serde::Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Login request data
#[derive(Debug, Clone, serde::Deserialize)]
pub struct LoginRequest {
    pub username_or_email: String,
    pub password: String,
}

/// Successful login: a session token and the public identity
#[derive(Debug, Clone, serde::Serialize)]
pub struct LoginResponse {
    pub token: String,
    /// Unix timestamp at which the token stops being accepted
    pub expires_at: i64,
    pub user: PublicUser,
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    verification: VerificationService,
    jwt_service: JwtService,
}

impl AuthService {
    /// Create a new authentication service
    pub fn new(
        users: Arc<dyn UserStore>,
        verification: VerificationService,
        jwt_service: JwtService,
    ) -> Self {
        Self {
            users,
            verification,
            jwt_service,
        }
    }

    /// Validate email format: `local@domain.tld`
    fn validate_email(email: &str) -> Result<(), AuthError> {
        let Some((local, domain)) = email.split_once('@') else {
            return Err(AuthError::InvalidEmail);
        };

        if local.is_empty() || domain.contains('@') || email.chars().any(char::is_whitespace) {
            return Err(AuthError::InvalidEmail);
        }

        if !domain.contains('.') || domain.split('.').any(str::is_empty) {
            return Err(AuthError::InvalidEmail);
        }

        Ok(())
    }

    /// Validate username format. A valid username never contains `@`,
    /// which keeps login lookups unambiguous.
    fn validate_username(username: &str) -> Result<(), AuthError> {
        let len = username.chars().count();
        if !(MIN_USERNAME_LEN..=MAX_USERNAME_LEN).contains(&len) {
            return Err(AuthError::InvalidUsername);
        }

        // Must start with a letter
        if !username
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic())
        {
            return Err(AuthError::InvalidUsername);
        }

        if !username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(AuthError::InvalidUsername);
        }

        Ok(())
    }

    /// Validate password length
    fn validate_password(password: &str) -> Result<(), AuthError> {
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::PasswordTooShort);
        }

        if password.len() > MAX_PASSWORD_BYTES {
            return Err(AuthError::PasswordTooLong);
        }

        Ok(())
    }

    /// Register a new, unverified user and send the verification email.
    /// Returns the new user id.
    pub async fn register(&self, request: RegisterRequest) -> Result<i64, AuthError> {
        Self::validate_username(&request.username)?;
        Self::validate_email(&request.email)?;
        Self::validate_password(&request.password)?;

        if self
            .users
            .find_by_username(&request.username)
            .await?
            .is_some()
        {
            return Err(AuthError::DuplicateUsername);
        }

        if self.users.find_by_email(&request.email).await?.is_some() {
            return Err(AuthError::DuplicateEmail);
        }

        let password_hash = hash_password(&request.password)?;

        let user = self
            .users
            .create(&NewUser {
                username: request.username,
                email: request.email,
                password_hash,
            })
            .await?;

        // The account stays; the client can ask for a new token via resend
        if let Err(e) = self.verification.issue(user.id, &user.email).await {
            tracing::error!(
                "Failed to send verification email for user {}: {}",
                user.id,
                e
            );
            return Err(AuthError::VerificationDispatchFailed);
        }

        Ok(user.id)
    }

    /// Login with a username or an email address
    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, AuthError> {
        let user = self
            .find_login_user(&request.username_or_email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !user.is_verified {
            return Err(AuthError::EmailNotVerified);
        }

        if !verify_password(&request.password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        let issued = self.jwt_service.generate_token(user.id, &user.username)?;

        Ok(LoginResponse {
            token: issued.token,
            expires_at: issued.expires_at,
            user: PublicUser::from(&user),
        })
    }

    async fn find_login_user(&self, username_or_email: &str) -> Result<Option<User>, AuthError> {
        let user = if username_or_email.contains('@') {
            self.users.find_by_email(username_or_email).await?
        } else {
            self.users.find_by_username(username_or_email).await?
        };
        Ok(user)
    }

    /// Redeem a verification token and mark its owner verified
    pub async fn verify_email(&self, token: &str) -> Result<(), AuthError> {
        if token.is_empty() {
            return Err(AuthError::InvalidOrExpiredToken);
        }

        let user_id = self
            .verification
            .redeem(token)
            .await?
            .ok_or(AuthError::InvalidOrExpiredToken)?;

        // Cascade delete means a live token always has a user
        if !self.users.mark_verified(user_id).await? {
            return Err(AuthError::InvalidOrExpiredToken);
        }

        tracing::info!("Email verified for user {}", user_id);
        Ok(())
    }

    /// Replace any outstanding token for an unverified account and mail a new one
    pub async fn resend_verification(&self, email: &str) -> Result<(), AuthError> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if user.is_verified {
            return Err(AuthError::AlreadyVerified);
        }

        if let Err(e) = self.verification.issue(user.id, &user.email).await {
            tracing::error!(
                "Failed to resend verification email for user {}: {}",
                user.id,
                e
            );
            return Err(AuthError::VerificationDispatchFailed);
        }

        Ok(())
    }

    /// Profile of an authenticated user
    pub async fn profile(&self, user_id: i64) -> Result<UserResponse, AuthError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        Ok(user.into())
    }
}
