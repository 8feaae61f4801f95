//! Application API endpoints
//!
//! All routes require a bearer token. Create and update take
//! `multipart/form-data` with the text fields of an application and an
//! optional `resume` file part.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        DefaultBodyLimit, FromRef, Multipart, Path, State,
        multipart::{MultipartError, MultipartRejection},
        rejection::PathRejection,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};

use crate::core::applications::service::{
    ApplicationError, ApplicationForm, ApplicationService, MAX_RESUME_BYTES, ResumeUpload,
};
use crate::core::auth::api::{ApiError, MessageResponse};
use crate::core::auth::session::{CurrentUser, SessionValidator};
use crate::core::db::models::Application;

/// Room for the text fields and part headers around a maximum-size resume
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Application API state
#[derive(Clone)]
pub struct ApplicationsApiState {
    pub service: ApplicationService,
    pub sessions: SessionValidator,
}

impl FromRef<Arc<ApplicationsApiState>> for SessionValidator {
    fn from_ref(state: &Arc<ApplicationsApiState>) -> Self {
        state.sessions.clone()
    }
}

impl IntoResponse for ApplicationError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApplicationError::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApplicationError::ResumeRequired => (StatusCode::BAD_REQUEST, "RESUME_REQUIRED"),
            ApplicationError::InvalidFileType => (StatusCode::BAD_REQUEST, "INVALID_FILE_TYPE"),
            ApplicationError::PayloadTooLarge => (StatusCode::BAD_REQUEST, "PAYLOAD_TOO_LARGE"),
            ApplicationError::InvalidDate(_) => (StatusCode::BAD_REQUEST, "INVALID_DATE"),
            ApplicationError::InvalidStatus(_) => (StatusCode::BAD_REQUEST, "INVALID_STATUS"),
            ApplicationError::MissingField(_) => (StatusCode::BAD_REQUEST, "MISSING_FIELD"),
            ApplicationError::NoteTooLong => (StatusCode::BAD_REQUEST, "NOTE_TOO_LONG"),
            ApplicationError::InvalidForm(_) => (StatusCode::BAD_REQUEST, "INVALID_FORM"),
            ApplicationError::ResumeFileMissing => {
                (StatusCode::INTERNAL_SERVER_ERROR, "RESUME_FILE_MISSING")
            }
            ApplicationError::StorageFailure(detail) => {
                tracing::error!("Application storage failure: {}", detail);
                let body = ApiError::new("Internal server error", "STORAGE_FAILURE");
                return (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
            }
        };

        (status, Json(ApiError::new(self.to_string(), code))).into_response()
    }
}

/// Create the application API router
pub fn applications_api_router(state: ApplicationsApiState) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route("/applications", get(list_handler).post(create_handler))
        .route(
            "/applications/{id}",
            get(get_handler).put(update_handler).delete(delete_handler),
        )
        .layer(DefaultBodyLimit::max(
            MAX_RESUME_BYTES + MULTIPART_OVERHEAD_BYTES,
        ))
        .with_state(state)
}

fn multipart_error(err: MultipartError) -> ApplicationError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApplicationError::PayloadTooLarge
    } else {
        ApplicationError::InvalidForm(err.body_text())
    }
}

fn path_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, ApplicationError> {
    path.map(|Path(id)| id)
        .map_err(|_| ApplicationError::NotFound)
}

/// Collect the known form fields and the resume part. Unknown fields,
/// including any client-supplied `user_id`, are skipped.
async fn read_submission(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(ApplicationForm, Option<ResumeUpload>), ApplicationError> {
    let mut multipart =
        multipart.map_err(|rejection| ApplicationError::InvalidForm(rejection.body_text()))?;

    let mut form = ApplicationForm::default();
    let mut resume = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        let slot = match name.as_str() {
            "company" => &mut form.company,
            "position" => &mut form.position,
            "status" => &mut form.status,
            "location" => &mut form.location,
            "applied_date" => &mut form.applied_date,
            "term" => &mut form.term,
            "note" => &mut form.note,
            "resume" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(multipart_error)?;

                // An empty file input submits a nameless, empty part
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }

                resume = Some(ResumeUpload {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
                continue;
            }
            _ => continue,
        };

        *slot = Some(field.text().await.map_err(multipart_error)?);
    }

    Ok((form, resume))
}

/// GET /applications
async fn list_handler(
    State(state): State<Arc<ApplicationsApiState>>,
    current_user: CurrentUser,
) -> Result<Json<Vec<Application>>, ApplicationError> {
    let applications = state.service.list(current_user.id).await?;
    Ok(Json(applications))
}

/// GET /applications/{id}
async fn get_handler(
    State(state): State<Arc<ApplicationsApiState>>,
    current_user: CurrentUser,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Application>, ApplicationError> {
    let id = path_id(path)?;
    let application = state.service.get(current_user.id, id).await?;
    Ok(Json(application))
}

/// POST /applications
async fn create_handler(
    State(state): State<Arc<ApplicationsApiState>>,
    current_user: CurrentUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<Application>), ApplicationError> {
    let (form, resume) = read_submission(multipart).await?;

    let application = state.service.create(current_user.id, form, resume).await?;

    Ok((StatusCode::CREATED, Json(application)))
}

/// PUT /applications/{id}
async fn update_handler(
    State(state): State<Arc<ApplicationsApiState>>,
    current_user: CurrentUser,
    path: Result<Path<i64>, PathRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Application>, ApplicationError> {
    let id = path_id(path)?;
    let (form, resume) = read_submission(multipart).await?;

    let application = state
        .service
        .update(current_user.id, id, form, resume)
        .await?;

    Ok(Json(application))
}

/// DELETE /applications/{id}
async fn delete_handler(
    State(state): State<Arc<ApplicationsApiState>>,
    current_user: CurrentUser,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<MessageResponse>, ApplicationError> {
    let id = path_id(path)?;
    state.service.delete(current_user.id, id).await?;

    Ok(Json(MessageResponse::new("Application deleted successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_are_bad_request() {
        let cases = [
            ApplicationError::ResumeRequired,
            ApplicationError::InvalidFileType,
            ApplicationError::PayloadTooLarge,
            ApplicationError::InvalidDate("yesterday".to_string()),
            ApplicationError::MissingField("company"),
            ApplicationError::NoteTooLong,
            ApplicationError::InvalidForm("bad boundary".to_string()),
        ];

        for err in cases {
            assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn test_storage_errors_are_internal() {
        assert_eq!(
            ApplicationError::ResumeFileMissing.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApplicationError::StorageFailure("disk full".to_string())
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_not_found() {
        assert_eq!(
            ApplicationError::NotFound.into_response().status(),
            StatusCode::NOT_FOUND
        );
    }
}
