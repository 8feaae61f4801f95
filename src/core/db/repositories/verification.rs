//! Email verification repository
//!
//! Stores single-use verification tokens as SHA-256 hashes, mirroring how
//! session secrets are kept out of the database in plain form.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use sqlx::PgPool;

use crate::core::db::models::EmailVerification;

/// Verification repository error types
#[derive(Debug, thiserror::Error)]
pub enum VerificationRepositoryError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Hash a raw verification token using SHA-256
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Verification token persistence
#[async_trait]
pub trait VerificationStore: Send + Sync {
    async fn create(
        &self,
        user_id: i64,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<EmailVerification, VerificationRepositoryError>;

    /// Find a token that has not expired as of `now`
    async fn find_live(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<EmailVerification>, VerificationRepositoryError>;

    /// Delete one token. Returns false if it was already gone.
    async fn delete(&self, id: i64) -> Result<bool, VerificationRepositoryError>;

    /// Delete every token issued to a user
    async fn delete_all_for_user(&self, user_id: i64) -> Result<u64, VerificationRepositoryError>;
}

/// PostgreSQL-backed verification repository
#[derive(Clone)]
pub struct VerificationRepository {
    pool: PgPool,
}

impl VerificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Clean up expired tokens
    pub async fn cleanup_expired(&self) -> Result<u64, VerificationRepositoryError> {
        let result = sqlx::query(
            r#"
            DELETE FROM email_verifications
            WHERE expires_at < NOW()
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl VerificationStore for VerificationRepository {
    async fn create(
        &self,
        user_id: i64,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<EmailVerification, VerificationRepositoryError> {
        let verification = sqlx::query_as::<_, EmailVerification>(
            r#"
            INSERT INTO email_verifications (user_id, token_hash, expires_at)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, token_hash, created_at, expires_at
            "#,
        )
        .bind(user_id)
        .bind(token_hash)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(verification)
    }

    async fn find_live(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<EmailVerification>, VerificationRepositoryError> {
        let verification = sqlx::query_as::<_, EmailVerification>(
            r#"
            SELECT id, user_id, token_hash, created_at, expires_at
            FROM email_verifications
            WHERE token_hash = $1 AND expires_at > $2
            "#,
        )
        .bind(token_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(verification)
    }

    async fn delete(&self, id: i64) -> Result<bool, VerificationRepositoryError> {
        let result = sqlx::query("DELETE FROM email_verifications WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_all_for_user(&self, user_id: i64) -> Result<u64, VerificationRepositoryError> {
        let result = sqlx::query("DELETE FROM email_verifications WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
