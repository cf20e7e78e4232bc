//! Axum route handlers for the Jobs API. Every lookup is scoped to the caller:
//! another user's job is indistinguishable from a missing one.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::auth::{AuthUser, Identity};
use crate::errors::AppError;
use crate::jobs::{read_upload, CreateJobRequest};
use crate::models::job::{JobRow, NewJob};
use crate::state::AppState;
use crate::store::load_user;

/// POST /api/v1/jobs
pub async fn handle_create_job(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Json(request): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<JobRow>), AppError> {
    let new_job = request.validate()?;
    create_job(&state, &identity, new_job).await
}

/// POST /api/v1/jobs/upload
///
/// Multipart: `jobDescription` plus a resume `file` (.docx, .pdf, .txt, .md).
pub async fn handle_upload_job(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<JobRow>), AppError> {
    let new_job = read_upload(multipart).await?;
    create_job(&state, &identity, new_job).await
}

/// GET /api/v1/jobs
pub async fn handle_list_jobs(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<Json<Vec<JobRow>>, AppError> {
    let user = load_user(state.store.as_ref(), &identity, state.config.monthly_credits).await?;
    let jobs = state.store.list_jobs(user.id).await?;
    Ok(Json(jobs))
}

/// GET /api/v1/jobs/:id
pub async fn handle_get_job(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobRow>, AppError> {
    let user = load_user(state.store.as_ref(), &identity, state.config.monthly_credits).await?;
    let job = state
        .store
        .find_job(job_id, user.id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;
    Ok(Json(job))
}

/// DELETE /api/v1/jobs/:id
pub async fn handle_delete_job(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Path(job_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let user = load_user(state.store.as_ref(), &identity, state.config.monthly_credits).await?;
    if !state.store.delete_job(job_id, user.id).await? {
        return Err(AppError::NotFound(format!("Job {job_id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn create_job(
    state: &AppState,
    identity: &Identity,
    new_job: NewJob,
) -> Result<(StatusCode, Json<JobRow>), AppError> {
    let user = load_user(state.store.as_ref(), identity, state.config.monthly_credits).await?;
    let job = state.store.create_job(user.id, new_job).await?;
    Ok((StatusCode::CREATED, Json(job)))
}
