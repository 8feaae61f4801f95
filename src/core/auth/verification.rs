//! Email verification tokens
//!
//! Tokens are 32 random bytes, hex encoded, valid for 24 hours and single use.
//! Issuing a token for a user first removes any earlier ones, so at most one
//! live token exists per user.

use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::core::db::repositories::{VerificationRepositoryError, VerificationStore, hash_token};
use crate::core::mail::{MailError, Mailer};

/// Lifetime of a verification token
pub const VERIFICATION_TOKEN_TTL_HOURS: i64 = 24;

/// Verification errors
#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    #[error("Token storage failed: {0}")]
    Store(#[from] VerificationRepositoryError),

    #[error("Verification email could not be sent: {0}")]
    Mail(#[from] MailError),
}

/// Generate a random verification token (64 hex chars)
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

/// Issues, mails and redeems verification tokens
#[derive(Clone)]
pub struct VerificationService {
    store: Arc<dyn VerificationStore>,
    mailer: Arc<dyn Mailer>,
}

impl VerificationService {
    pub fn new(store: Arc<dyn VerificationStore>, mailer: Arc<dyn Mailer>) -> Self {
        Self { store, mailer }
    }

    /// Replace any outstanding tokens for the user with a new one and mail it
    pub async fn issue(&self, user_id: i64, email: &str) -> Result<(), VerificationError> {
        let superseded = self.store.delete_all_for_user(user_id).await?;
        if superseded > 0 {
            tracing::debug!(
                "Superseded {} verification token(s) for user {}",
                superseded,
                user_id
            );
        }

        let token = generate_token();
        let expires_at = Utc::now() + Duration::hours(VERIFICATION_TOKEN_TTL_HOURS);
        self.store
            .create(user_id, &hash_token(&token), expires_at)
            .await?;

        self.mailer.send_verification(email, &token).await?;
        Ok(())
    }

    /// Consume a token. Returns the owning user id, or `None` when the token is
    /// unknown, expired or already used.
    pub async fn redeem(&self, token: &str) -> Result<Option<i64>, VerificationError> {
        let Some(verification) = self
            .store
            .find_live(&hash_token(token), Utc::now())
            .await?
        else {
            return Ok(None);
        };

        // Whoever deletes the row owns the redemption
        if !self.store.delete(verification.id).await? {
            return Ok(None);
        }

        Ok(Some(verification.user_id))
    }
}
