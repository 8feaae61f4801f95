//! Application service
//!
//! Owner-scoped CRUD over internship applications, plus the resume file that
//! belongs to each one. Every operation takes the owner id of the caller; an
//! application owned by someone else behaves exactly like a missing one.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};

use crate::core::applications::uploads::{UploadError, UploadStore};
use crate::core::db::models::{
    Application, ApplicationChanges, ApplicationFields, ApplicationStatus, InvalidStatus,
    NewApplication,
};
use crate::core::db::repositories::{ApplicationRepositoryError, ApplicationStore};

/// Largest accepted resume upload
pub const MAX_RESUME_BYTES: usize = 5 * 1024 * 1024;

/// Longest accepted note, in characters
pub const MAX_NOTE_CHARS: usize = 1048;

const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Application service error types
#[derive(Debug, thiserror::Error)]
pub enum ApplicationError {
    #[error("Application not found")]
    NotFound,

    #[error("A resume file is required")]
    ResumeRequired,

    #[error("Only PDF resumes are accepted")]
    InvalidFileType,

    #[error("Resume exceeds the 5 MB limit")]
    PayloadTooLarge,

    #[error("Invalid applied_date {0:?}, expected RFC 3339 or YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Invalid status: {0}")]
    InvalidStatus(#[from] InvalidStatus),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Note exceeds 1048 characters")]
    NoteTooLong,

    #[error("Invalid form data: {0}")]
    InvalidForm(String),

    #[error("Resume file is missing from storage")]
    ResumeFileMissing,

    #[error("Storage failure: {0}")]
    StorageFailure(String),
}

impl From<ApplicationRepositoryError> for ApplicationError {
    fn from(err: ApplicationRepositoryError) -> Self {
        ApplicationError::StorageFailure(err.to_string())
    }
}

impl From<UploadError> for ApplicationError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::NotFound(_) => ApplicationError::ResumeFileMissing,
            UploadError::Io(e) => ApplicationError::StorageFailure(e.to_string()),
        }
    }
}

/// Raw form values as submitted. Absent fields are `None`.
#[derive(Debug, Clone, Default)]
pub struct ApplicationForm {
    pub company: Option<String>,
    pub position: Option<String>,
    pub status: Option<String>,
    pub location: Option<String>,
    pub applied_date: Option<String>,
    pub term: Option<String>,
    pub note: Option<String>,
}

/// An uploaded resume file
#[derive(Debug, Clone)]
pub struct ResumeUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl ResumeUpload {
    fn is_pdf(&self) -> bool {
        let by_type = self
            .content_type
            .as_deref()
            .is_some_and(|ct| ct.eq_ignore_ascii_case(PDF_CONTENT_TYPE));
        let by_name = self.file_name.to_ascii_lowercase().ends_with(".pdf");
        by_type || by_name
    }

    /// File type first, then size
    fn validate(&self) -> Result<(), ApplicationError> {
        if !self.is_pdf() {
            return Err(ApplicationError::InvalidFileType);
        }
        if self.bytes.len() > MAX_RESUME_BYTES {
            return Err(ApplicationError::PayloadTooLarge);
        }
        Ok(())
    }
}

/// Accepts RFC 3339 timestamps or plain dates, which mean midnight UTC
pub fn parse_applied_date(raw: &str) -> Result<DateTime<Utc>, ApplicationError> {
    let raw = raw.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
        .ok_or_else(|| ApplicationError::InvalidDate(raw.to_string()))
}

fn required(value: Option<String>, name: &'static str) -> Result<String, ApplicationError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(ApplicationError::MissingField(name)),
    }
}

impl ApplicationForm {
    /// Validate and normalize the submitted values
    pub fn validate(self) -> Result<ApplicationFields, ApplicationError> {
        let applied_date = parse_applied_date(self.applied_date.as_deref().unwrap_or_default())?;

        let status: ApplicationStatus = self
            .status
            .as_deref()
            .ok_or_else(|| InvalidStatus(String::new()))?
            .parse()?;

        let company = required(self.company, "company")?;
        let position = required(self.position, "position")?;

        let note = self.note.filter(|n| !n.trim().is_empty());
        if note
            .as_ref()
            .is_some_and(|n| n.chars().count() > MAX_NOTE_CHARS)
        {
            return Err(ApplicationError::NoteTooLong);
        }

        Ok(ApplicationFields {
            company,
            position,
            status,
            location: self.location.unwrap_or_default().trim().to_string(),
            applied_date,
            term: self.term.unwrap_or_default().trim().to_string(),
            note,
        })
    }
}

/// Application service
#[derive(Clone)]
pub struct ApplicationService {
    store: Arc<dyn ApplicationStore>,
    uploads: UploadStore,
}

impl ApplicationService {
    pub fn new(store: Arc<dyn ApplicationStore>, uploads: UploadStore) -> Self {
        Self { store, uploads }
    }

    pub fn uploads(&self) -> &UploadStore {
        &self.uploads
    }

    pub async fn list(&self, owner_id: i64) -> Result<Vec<Application>, ApplicationError> {
        Ok(self.store.list_by_owner(owner_id).await?)
    }

    pub async fn get(&self, owner_id: i64, id: i64) -> Result<Application, ApplicationError> {
        self.store
            .find_by_owner(owner_id, id)
            .await?
            .ok_or(ApplicationError::NotFound)
    }

    /// Create an application. A PDF resume is mandatory.
    pub async fn create(
        &self,
        owner_id: i64,
        form: ApplicationForm,
        resume: Option<ResumeUpload>,
    ) -> Result<Application, ApplicationError> {
        let resume = resume.ok_or(ApplicationError::ResumeRequired)?;
        resume.validate()?;
        let fields = form.validate()?;

        let stored = self.uploads.save(&resume.file_name, &resume.bytes).await?;

        let new_application = NewApplication {
            user_id: owner_id,
            fields,
            resume_url: stored.url.clone(),
        };

        match self.store.create(&new_application).await {
            Ok(application) => {
                tracing::info!(
                    "Created application {} for user {}",
                    application.id,
                    owner_id
                );
                Ok(application)
            }
            Err(e) => {
                self.discard_upload(&stored.url).await;
                Err(e.into())
            }
        }
    }

    /// Replace an application's fields, and its resume when a new one is given
    pub async fn update(
        &self,
        owner_id: i64,
        id: i64,
        form: ApplicationForm,
        resume: Option<ResumeUpload>,
    ) -> Result<Application, ApplicationError> {
        let fields = form.validate()?;
        if let Some(resume) = &resume {
            resume.validate()?;
        }

        let existing = self.get(owner_id, id).await?;

        let stored = match &resume {
            Some(resume) => Some(self.uploads.save(&resume.file_name, &resume.bytes).await?),
            None => None,
        };

        let changes = ApplicationChanges {
            fields,
            resume_url: stored.as_ref().map(|s| s.url.clone()),
        };

        let updated = match self.store.update_by_owner(owner_id, id, &changes).await {
            Ok(Some(updated)) => updated,
            Ok(None) => {
                if let Some(stored) = &stored {
                    self.discard_upload(&stored.url).await;
                }
                return Err(ApplicationError::NotFound);
            }
            Err(e) => {
                if let Some(stored) = &stored {
                    self.discard_upload(&stored.url).await;
                }
                return Err(e.into());
            }
        };

        if stored.is_some()
            && !existing.resume_url.is_empty()
            && let Err(e) = self.uploads.remove(&existing.resume_url).await
        {
            tracing::warn!(
                "Failed to delete replaced resume {} of application {}: {}",
                existing.resume_url,
                id,
                e
            );
        }

        tracing::info!("Updated application {} for user {}", id, owner_id);
        Ok(updated)
    }

    /// Delete an application and its resume. The file goes first; if it is
    /// already gone the row is kept and `ResumeFileMissing` is returned.
    pub async fn delete(&self, owner_id: i64, id: i64) -> Result<(), ApplicationError> {
        let existing = self.get(owner_id, id).await?;

        if !existing.resume_url.is_empty() {
            self.uploads.remove(&existing.resume_url).await.map_err(|e| {
                tracing::error!(
                    "Failed to delete resume {} of application {}: {}",
                    existing.resume_url,
                    id,
                    e
                );
                ApplicationError::from(e)
            })?;
        }

        if !self.store.delete_by_owner(owner_id, id).await? {
            return Err(ApplicationError::NotFound);
        }

        tracing::info!("Deleted application {} for user {}", id, owner_id);
        Ok(())
    }

    async fn discard_upload(&self, url: &str) {
        if let Err(e) = self.uploads.remove(url).await {
            tracing::warn!("Failed to clean up upload {}: {}", url, e);
        }
    }
}
