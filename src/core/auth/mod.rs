//! Authentication module for Internship Hub
//!
//! This module provides authentication functionality including:
//! - Password hashing with bcrypt
//! - JWT session token generation and validation
//! - Email verification tokens
//! - The `CurrentUser` extractor for protected routes
//! - REST API endpoints for auth operations

pub mod api;
pub mod jwt;
pub mod password;
pub mod service;
pub mod session;
pub mod verification;

pub use api::{ApiError, AuthApiState, MessageResponse, auth_api_router};
pub use jwt::{Claims, DEVELOPMENT_SECRET, JwtConfig, JwtError, JwtService};
pub use service::{AuthError, AuthService, LoginRequest, LoginResponse, RegisterRequest};
pub use session::{CurrentUser, SessionError, SessionValidator};
pub use verification::{VerificationError, VerificationService};
