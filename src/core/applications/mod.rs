//! Internship applications
//!
//! Owner-scoped CRUD, resume uploads and the REST endpoints on top of them.

pub mod api;
pub mod service;
pub mod uploads;

pub use api::{ApplicationsApiState, applications_api_router};
pub use service::{
    ApplicationError, ApplicationForm, ApplicationService, MAX_RESUME_BYTES, ResumeUpload,
};
pub use uploads::{UploadError, UploadStore};
