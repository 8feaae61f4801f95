//! Database models for Internship Hub
//!
//! This module defines the database entity structs that map to PostgreSQL tables.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ============================================================================
// User Model
// ============================================================================

/// User entity representing a registered account
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User data for creation (password must already be hashed)
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// Public identity returned alongside a session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: i64,
    pub username: String,
    pub email: String,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
        }
    }
}

/// User without sensitive data (for profile responses)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            is_verified: user.is_verified,
            created_at: user.created_at,
        }
    }
}

// ============================================================================
// Email Verification Model
// ============================================================================

/// Pending email verification. Only the SHA-256 digest of the emailed token is stored.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EmailVerification {
    pub id: i64,
    pub user_id: i64,
    #[serde(skip_serializing)]
    pub token_hash: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl EmailVerification {
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

// ============================================================================
// Application Model
// ============================================================================

/// Progress of an internship application.
///
/// Stored as `SMALLINT` and exchanged over JSON as its ordinal, so the set of
/// accepted values is closed at every boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(into = "i16", try_from = "i16")]
#[repr(i16)]
pub enum ApplicationStatus {
    Applied = 0,
    OAReceived = 1,
    Interviewing = 2,
    Accepted = 3,
    Rejected = 4,
}

/// Returned when a status ordinal is outside `0..=4`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("status must be an integer between 0 and 4, got {0:?}")]
pub struct InvalidStatus(pub String);

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 5] = [
        ApplicationStatus::Applied,
        ApplicationStatus::OAReceived,
        ApplicationStatus::Interviewing,
        ApplicationStatus::Accepted,
        ApplicationStatus::Rejected,
    ];

    pub fn ordinal(self) -> i16 {
        self as i16
    }

    pub fn from_ordinal(ordinal: i64) -> Option<Self> {
        usize::try_from(ordinal)
            .ok()
            .and_then(|idx| Self::ALL.get(idx).copied())
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplicationStatus::Applied => write!(f, "Applied"),
            ApplicationStatus::OAReceived => write!(f, "OAReceived"),
            ApplicationStatus::Interviewing => write!(f, "Interviewing"),
            ApplicationStatus::Accepted => write!(f, "Accepted"),
            ApplicationStatus::Rejected => write!(f, "Rejected"),
        }
    }
}

impl From<ApplicationStatus> for i16 {
    fn from(status: ApplicationStatus) -> Self {
        status.ordinal()
    }
}

impl TryFrom<i16> for ApplicationStatus {
    type Error = InvalidStatus;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        Self::from_ordinal(value.into()).ok_or_else(|| InvalidStatus(value.to_string()))
    }
}

/// Parses the ordinal form sent by multipart submissions, e.g. `"2"`.
impl FromStr for ApplicationStatus {
    type Err = InvalidStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<i64>()
            .ok()
            .and_then(Self::from_ordinal)
            .ok_or_else(|| InvalidStatus(s.to_string()))
    }
}

/// Application entity, always owned by exactly one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Application {
    pub id: i64,
    pub company: String,
    pub position: String,
    pub status: ApplicationStatus,
    pub location: String,
    pub applied_date: DateTime<Utc>,
    pub term: String,
    pub note: Option<String>,
    pub resume_url: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated, user-editable application fields
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationFields {
    pub company: String,
    pub position: String,
    pub status: ApplicationStatus,
    pub location: String,
    pub applied_date: DateTime<Utc>,
    pub term: String,
    pub note: Option<String>,
}

/// Application data for creation
#[derive(Debug, Clone)]
pub struct NewApplication {
    pub user_id: i64,
    pub fields: ApplicationFields,
    pub resume_url: String,
}

/// Full replacement of an application's fields.
/// `resume_url: None` keeps the stored resume.
#[derive(Debug, Clone)]
pub struct ApplicationChanges {
    pub fields: ApplicationFields,
    pub resume_url: Option<String>,
}
