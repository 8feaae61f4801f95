//! Database repositories for Internship Hub
//!
//! Each repository pairs a store trait, which is what services depend on, with
//! its PostgreSQL implementation. Services receive the stores as trait objects
//! constructed once at startup.

pub mod application;
pub mod user;
pub mod verification;

pub use application::{ApplicationRepository, ApplicationRepositoryError, ApplicationStore};
pub use user::{UserRepository, UserRepositoryError, UserStore};
pub use verification::{
    VerificationRepository, VerificationRepositoryError, VerificationStore, hash_token,
};
