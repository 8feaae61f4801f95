//! User repository for database operations
//!
//! Persists accounts. Password hashing happens in the auth layer; this
//! repository only ever sees bcrypt hashes.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::core::db::models::{NewUser, User};

const USERNAME_UNIQUE_CONSTRAINT: &str = "users_username_key";
const EMAIL_UNIQUE_CONSTRAINT: &str = "users_email_key";

/// User repository error types
#[derive(Debug, thiserror::Error)]
pub enum UserRepositoryError {
    #[error("Username already exists")]
    UsernameAlreadyExists,

    #[error("Email already exists")]
    EmailAlreadyExists,

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

impl UserRepositoryError {
    /// Map a unique-constraint violation on insert to the matching duplicate error
    fn from_insert_error(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            match db_err.constraint() {
                Some(USERNAME_UNIQUE_CONSTRAINT) => return Self::UsernameAlreadyExists,
                Some(EMAIL_UNIQUE_CONSTRAINT) => return Self::EmailAlreadyExists,
                _ => {}
            }
        }
        Self::DatabaseError(err)
    }
}

/// Account persistence
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new unverified user
    async fn create(&self, user: &NewUser) -> Result<User, UserRepositoryError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, UserRepositoryError>;

    /// Exact, case-sensitive match
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, UserRepositoryError>;

    /// Exact, case-sensitive match
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserRepositoryError>;

    /// Flip `is_verified` to true. Returns false when the user no longer exists.
    async fn mark_verified(&self, id: i64) -> Result<bool, UserRepositoryError>;
}

/// PostgreSQL-backed user repository
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn create(&self, user: &NewUser) -> Result<User, UserRepositoryError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, username, email, password_hash, is_verified, created_at, updated_at
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(UserRepositoryError::from_insert_error)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, UserRepositoryError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, is_verified, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, UserRepositoryError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, is_verified, created_at, updated_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserRepositoryError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, is_verified, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn mark_verified(&self, id: i64) -> Result<bool, UserRepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET is_verified = TRUE, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_repository_error_display() {
        assert_eq!(
            UserRepositoryError::UsernameAlreadyExists.to_string(),
            "Username already exists"
        );
        assert_eq!(
            UserRepositoryError::EmailAlreadyExists.to_string(),
            "Email already exists"
        );
    }

    #[test]
    fn test_non_unique_insert_error_stays_database_error() {
        let err = UserRepositoryError::from_insert_error(sqlx::Error::RowNotFound);
        assert!(matches!(err, UserRepositoryError::DatabaseError(_)));
    }

    // ========================================================================
    // Integration Tests (require database)
    // ========================================================================

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_create_and_verify_user() {
        let repo = UserRepository::new(create_test_pool().await);
        let suffix = &uuid::Uuid::new_v4().simple().to_string()[..8];

        let user = repo
            .create(&NewUser {
                username: format!("pg_user_{suffix}"),
                email: format!("pg_{suffix}@example.com"),
                password_hash: "$2b$12$placeholder".to_string(),
            })
            .await
            .unwrap();
        assert!(!user.is_verified);

        let duplicate = repo
            .create(&NewUser {
                username: user.username.clone(),
                email: format!("other_{suffix}@example.com"),
                password_hash: "$2b$12$placeholder".to_string(),
            })
            .await;
        assert!(matches!(
            duplicate,
            Err(UserRepositoryError::UsernameAlreadyExists)
        ));

        assert!(repo.mark_verified(user.id).await.unwrap());
        let reloaded = repo.find_by_id(user.id).await.unwrap().unwrap();
        assert!(reloaded.is_verified);
    }

    async fn create_test_pool() -> PgPool {
        use crate::core::db::pool::{DbConfig, create_pool_with_migrations};

        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");
        create_pool_with_migrations(&DbConfig::new(url))
            .await
            .expect("Failed to create test pool")
    }
}
