//! Axum route handlers for tailoring, credits, and anonymous sessions.

use axum::{
    extract::{Multipart, Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::jobs::{read_upload, CreateJobRequest};
use crate::models::job::{AnonymousJobRow, NewJob};
use crate::state::AppState;
use crate::store::load_user;
use crate::tailoring::orchestrator::{tailor_anonymous_job, tailor_job};
use crate::tailoring::TailoredDocument;

pub const SESSION_HEADER: &str = "x-session-id";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditsResponse {
    pub credits: i32,
    pub resets_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnonymousSessionResponse {
    pub session_id: Uuid,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/jobs/:id/tailor
///
/// Runs the tailoring pipeline on an owned job. Costs one credit on success only.
pub async fn handle_tailor_job(
    State(state): State<AppState>,
    auth: Option<AuthUser>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<TailoredDocument>, AppError> {
    let identity = auth.map(|AuthUser(identity)| identity);
    let outcome = tailor_job(
        state.store.as_ref(),
        state.llm.as_ref(),
        state.config.monthly_credits,
        identity.as_ref(),
        job_id,
    )
    .await?;
    Ok(Json(outcome.document))
}

/// GET /api/v1/credits
///
/// Current balance after any due monthly reset, and when the next reset happens.
pub async fn handle_get_credits(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<Json<CreditsResponse>, AppError> {
    let user = load_user(state.store.as_ref(), &identity, state.config.monthly_credits).await?;

    Ok(Json(CreditsResponse {
        credits: user.credits,
        resets_at: next_month_start(user.credits_reset_at),
    }))
}

/// POST /api/v1/anonymous/sessions
pub async fn handle_create_anonymous_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<AnonymousSessionResponse>), AppError> {
    let session = state.store.create_anonymous_session().await?;
    Ok((
        StatusCode::CREATED,
        Json(AnonymousSessionResponse {
            session_id: session.id,
        }),
    ))
}

/// POST /api/v1/anonymous/jobs
pub async fn handle_create_anonymous_job(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<AnonymousJobRow>), AppError> {
    let session_id = session_id(&headers).ok_or(AppError::Unauthorized)?;
    let new_job = request.validate()?;
    create_anonymous_job(&state, session_id, new_job).await
}

/// POST /api/v1/anonymous/jobs/upload
///
/// Multipart variant: `jobDescription` text field plus a `file` (or `resumeText`).
pub async fn handle_upload_anonymous_job(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<(StatusCode, Json<AnonymousJobRow>), AppError> {
    let session_id = session_id(&headers).ok_or(AppError::Unauthorized)?;
    let new_job = read_upload(multipart).await?;
    create_anonymous_job(&state, session_id, new_job).await
}

async fn create_anonymous_job(
    state: &AppState,
    session_id: Uuid,
    new_job: NewJob,
) -> Result<(StatusCode, Json<AnonymousJobRow>), AppError> {
    state
        .store
        .find_anonymous_session(session_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Session not found".to_string()))?;

    let job = state.store.create_anonymous_job(session_id, new_job).await?;
    Ok((StatusCode::CREATED, Json(job)))
}

/// GET /api/v1/anonymous/jobs/:id
pub async fn handle_get_anonymous_job(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(job_id): Path<Uuid>,
) -> Result<Json<AnonymousJobRow>, AppError> {
    let session_id = session_id(&headers).ok_or(AppError::Unauthorized)?;
    let job = state
        .store
        .find_anonymous_job(job_id, session_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;
    Ok(Json(job))
}

/// POST /api/v1/anonymous/jobs/:id/tailor
///
/// One free tailoring per anonymous session.
pub async fn handle_tailor_anonymous_job(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(job_id): Path<Uuid>,
) -> Result<Json<TailoredDocument>, AppError> {
    let outcome = tailor_anonymous_job(
        state.store.as_ref(),
        state.llm.as_ref(),
        session_id(&headers),
        job_id,
    )
    .await?;
    Ok(Json(outcome.document))
}

/// Reads the anonymous session id header. Malformed ids count as absent.
pub fn session_id(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v.trim()).ok())
}

/// First instant of the calendar month after `last_reset` (UTC).
fn next_month_start(last_reset: DateTime<Utc>) -> DateTime<Utc> {
    let (year, month) = if last_reset.month() == 12 {
        (last_reset.year() + 1, 1)
    } else {
        (last_reset.year(), last_reset.month() + 1)
    };
    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .unwrap_or(last_reset)
}
