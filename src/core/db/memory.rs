//! In-memory implementation of the store traits, used by service and router tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::core::db::models::{
    Application, ApplicationChanges, EmailVerification, NewApplication, NewUser, User,
};
use crate::core::db::repositories::{
    ApplicationRepositoryError, ApplicationStore, UserRepositoryError, UserStore,
    VerificationRepositoryError, VerificationStore,
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    verifications: Vec<EmailVerification>,
    applications: Vec<Application>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn verification_count(&self, user_id: i64) -> usize {
        let tables = self.tables.lock().await;
        tables
            .verifications
            .iter()
            .filter(|v| v.user_id == user_id)
            .count()
    }

    pub async fn application_count(&self) -> usize {
        self.tables.lock().await.applications.len()
    }

    /// Push every token of a user into the past
    pub async fn expire_verifications(&self, user_id: i64) {
        let mut tables = self.tables.lock().await;
        for verification in tables
            .verifications
            .iter_mut()
            .filter(|v| v.user_id == user_id)
        {
            verification.expires_at = Utc::now() - chrono::Duration::seconds(1);
        }
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, user: &NewUser) -> Result<User, UserRepositoryError> {
        let mut tables = self.tables.lock().await;
        if tables.users.iter().any(|u| u.username == user.username) {
            return Err(UserRepositoryError::UsernameAlreadyExists);
        }
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(UserRepositoryError::EmailAlreadyExists);
        }

        let now = Utc::now();
        let created = User {
            id: tables.next_id(),
            username: user.username.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            is_verified: false,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, UserRepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, UserRepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserRepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn mark_verified(&self, id: i64) -> Result<bool, UserRepositoryError> {
        let mut tables = self.tables.lock().await;
        match tables.users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.is_verified = true;
                user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl VerificationStore for MemoryStore {
    async fn create(
        &self,
        user_id: i64,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<EmailVerification, VerificationRepositoryError> {
        let mut tables = self.tables.lock().await;
        let verification = EmailVerification {
            id: tables.next_id(),
            user_id,
            token_hash: token_hash.to_string(),
            created_at: Utc::now(),
            expires_at,
        };
        tables.verifications.push(verification.clone());
        Ok(verification)
    }

    async fn find_live(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<EmailVerification>, VerificationRepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .verifications
            .iter()
            .find(|v| v.token_hash == token_hash && v.is_live_at(now))
            .cloned())
    }

    async fn delete(&self, id: i64) -> Result<bool, VerificationRepositoryError> {
        let mut tables = self.tables.lock().await;
        let before = tables.verifications.len();
        tables.verifications.retain(|v| v.id != id);
        Ok(tables.verifications.len() < before)
    }

    async fn delete_all_for_user(&self, user_id: i64) -> Result<u64, VerificationRepositoryError> {
        let mut tables = self.tables.lock().await;
        let before = tables.verifications.len();
        tables.verifications.retain(|v| v.user_id != user_id);
        Ok((before - tables.verifications.len()) as u64)
    }
}

#[async_trait]
impl ApplicationStore for MemoryStore {
    async fn list_by_owner(
        &self,
        owner_id: i64,
    ) -> Result<Vec<Application>, ApplicationRepositoryError> {
        let tables = self.tables.lock().await;
        let mut owned: Vec<Application> = tables
            .applications
            .iter()
            .filter(|a| a.user_id == owner_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| {
            b.applied_date
                .cmp(&a.applied_date)
                .then_with(|| a.company.cmp(&b.company))
        });
        Ok(owned)
    }

    async fn find_by_owner(
        &self,
        owner_id: i64,
        id: i64,
    ) -> Result<Option<Application>, ApplicationRepositoryError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .applications
            .iter()
            .find(|a| a.id == id && a.user_id == owner_id)
            .cloned())
    }

    async fn create(
        &self,
        application: &NewApplication,
    ) -> Result<Application, ApplicationRepositoryError> {
        let mut tables = self.tables.lock().await;
        let now = Utc::now();
        let fields = application.fields.clone();
        let created = Application {
            id: tables.next_id(),
            company: fields.company,
            position: fields.position,
            status: fields.status,
            location: fields.location,
            applied_date: fields.applied_date,
            term: fields.term,
            note: fields.note,
            resume_url: application.resume_url.clone(),
            user_id: application.user_id,
            created_at: now,
            updated_at: now,
        };
        tables.applications.push(created.clone());
        Ok(created)
    }

    async fn update_by_owner(
        &self,
        owner_id: i64,
        id: i64,
        changes: &ApplicationChanges,
    ) -> Result<Option<Application>, ApplicationRepositoryError> {
        let mut tables = self.tables.lock().await;
        let Some(row) = tables
            .applications
            .iter_mut()
            .find(|a| a.id == id && a.user_id == owner_id)
        else {
            return Ok(None);
        };

        let fields = changes.fields.clone();
        row.company = fields.company;
        row.position = fields.position;
        row.status = fields.status;
        row.location = fields.location;
        row.applied_date = fields.applied_date;
        row.term = fields.term;
        row.note = fields.note;
        if let Some(url) = &changes.resume_url {
            row.resume_url = url.clone();
        }
        row.updated_at = Utc::now();
        Ok(Some(row.clone()))
    }

    async fn delete_by_owner(
        &self,
        owner_id: i64,
        id: i64,
    ) -> Result<bool, ApplicationRepositoryError> {
        let mut tables = self.tables.lock().await;
        let before = tables.applications.len();
        tables
            .applications
            .retain(|a| !(a.id == id && a.user_id == owner_id));
        Ok(tables.applications.len() < before)
    }
}
