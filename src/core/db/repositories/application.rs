//! Application repository for database operations
//!
//! Every query is filtered by the owning user, so a row that belongs to
//! someone else is indistinguishable from a row that does not exist.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::core::db::models::{Application, ApplicationChanges, NewApplication};

/// Application repository error types
#[derive(Debug, thiserror::Error)]
pub enum ApplicationRepositoryError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Owner-scoped application persistence
#[async_trait]
pub trait ApplicationStore: Send + Sync {
    /// All applications of an owner, newest `applied_date` first, then by company
    async fn list_by_owner(
        &self,
        owner_id: i64,
    ) -> Result<Vec<Application>, ApplicationRepositoryError>;

    async fn find_by_owner(
        &self,
        owner_id: i64,
        id: i64,
    ) -> Result<Option<Application>, ApplicationRepositoryError>;

    async fn create(
        &self,
        application: &NewApplication,
    ) -> Result<Application, ApplicationRepositoryError>;

    /// Returns `None` if no row with this id belongs to the owner
    async fn update_by_owner(
        &self,
        owner_id: i64,
        id: i64,
        changes: &ApplicationChanges,
    ) -> Result<Option<Application>, ApplicationRepositoryError>;

    async fn delete_by_owner(&self, owner_id: i64, id: i64)
    -> Result<bool, ApplicationRepositoryError>;
}

/// PostgreSQL-backed application repository
#[derive(Clone)]
pub struct ApplicationRepository {
    pool: PgPool,
}

impl ApplicationRepository {
    /// Create a new application repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ApplicationStore for ApplicationRepository {
    async fn list_by_owner(
        &self,
        owner_id: i64,
    ) -> Result<Vec<Application>, ApplicationRepositoryError> {
        let applications = sqlx::query_as::<_, Application>(
            r#"
            SELECT id, company, position, status, location, applied_date, term, note,
                   resume_url, user_id, created_at, updated_at
            FROM applications
            WHERE user_id = $1
            ORDER BY applied_date DESC, company ASC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(applications)
    }

    async fn find_by_owner(
        &self,
        owner_id: i64,
        id: i64,
    ) -> Result<Option<Application>, ApplicationRepositoryError> {
        let application = sqlx::query_as::<_, Application>(
            r#"
            SELECT id, company, position, status, location, applied_date, term, note,
                   resume_url, user_id, created_at, updated_at
            FROM applications
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(application)
    }

    async fn create(
        &self,
        application: &NewApplication,
    ) -> Result<Application, ApplicationRepositoryError> {
        let fields = &application.fields;
        let created = sqlx::query_as::<_, Application>(
            r#"
            INSERT INTO applications
                (company, position, status, location, applied_date, term, note, resume_url, user_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, company, position, status, location, applied_date, term, note,
                      resume_url, user_id, created_at, updated_at
            "#,
        )
        .bind(&fields.company)
        .bind(&fields.position)
        .bind(fields.status)
        .bind(&fields.location)
        .bind(fields.applied_date)
        .bind(&fields.term)
        .bind(&fields.note)
        .bind(&application.resume_url)
        .bind(application.user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn update_by_owner(
        &self,
        owner_id: i64,
        id: i64,
        changes: &ApplicationChanges,
    ) -> Result<Option<Application>, ApplicationRepositoryError> {
        let fields = &changes.fields;
        let updated = sqlx::query_as::<_, Application>(
            r#"
            UPDATE applications
            SET
                company = $3,
                position = $4,
                status = $5,
                location = $6,
                applied_date = $7,
                term = $8,
                note = $9,
                resume_url = COALESCE($10, resume_url),
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING id, company, position, status, location, applied_date, term, note,
                      resume_url, user_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(&fields.company)
        .bind(&fields.position)
        .bind(fields.status)
        .bind(&fields.location)
        .bind(fields.applied_date)
        .bind(&fields.term)
        .bind(&fields.note)
        .bind(&changes.resume_url)
        .fetch_optional(&self.pool)
        .await?;

        Ok(updated)
    }

    async fn delete_by_owner(
        &self,
        owner_id: i64,
        id: i64,
    ) -> Result<bool, ApplicationRepositoryError> {
        let result = sqlx::query(
            r#"
            DELETE FROM applications
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
