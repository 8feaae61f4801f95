//! Database module for Internship Hub
//!
//! This module provides database connectivity, models, and repositories
//! for persistent storage using PostgreSQL and SQLx.

#[cfg(test)]
pub mod memory;
pub mod models;
pub mod pool;
pub mod repositories;

// Re-export commonly used items
pub use models::*;
pub use pool::{DbConfig, DbError, DbTarget, create_pool, create_pool_with_migrations, health_check};
pub use repositories::{
    ApplicationRepository, ApplicationRepositoryError, ApplicationStore, UserRepository,
    UserRepositoryError, UserStore, VerificationRepository, VerificationRepositoryError,
    VerificationStore,
};

// Re-export sqlx types that might be needed
pub use sqlx::PgPool;
