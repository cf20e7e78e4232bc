use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::auth::AuthUser;
use crate::engagement::{TestimonialRequest, TicketRequest, WaitlistRequest};
use crate::errors::AppError;
use crate::models::engagement::{TestimonialRow, TicketRow};
use crate::state::AppState;
use crate::store::load_user;

#[derive(Debug, Serialize)]
pub struct WaitlistResponse {
    pub email: String,
    pub joined: bool,
}

/// POST /api/v1/waitlist
///
/// Idempotent: signing up twice returns 200 with `joined: false`.
pub async fn handle_join_waitlist(
    State(state): State<AppState>,
    Json(request): Json<WaitlistRequest>,
) -> Result<(StatusCode, Json<WaitlistResponse>), AppError> {
    let email = request.validate()?;
    let joined = state.store.join_waitlist(&email).await?;
    let status = if joined {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(WaitlistResponse { email, joined })))
}

/// GET /api/v1/testimonials
///
/// Public: approved testimonials only.
pub async fn handle_list_testimonials(
    State(state): State<AppState>,
) -> Result<Json<Vec<TestimonialRow>>, AppError> {
    Ok(Json(state.store.list_approved_testimonials().await?))
}

/// POST /api/v1/testimonials
///
/// Stored unapproved until an admin approves it.
pub async fn handle_create_testimonial(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Json(request): Json<TestimonialRequest>,
) -> Result<(StatusCode, Json<TestimonialRow>), AppError> {
    let testimonial = request.validate()?;
    let user = load_user(state.store.as_ref(), &identity, state.config.monthly_credits).await?;
    let row = state.store.create_testimonial(user.id, testimonial).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// POST /api/v1/tickets
pub async fn handle_create_ticket(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    Json(request): Json<TicketRequest>,
) -> Result<(StatusCode, Json<TicketRow>), AppError> {
    request.validate()?;
    let user = load_user(state.store.as_ref(), &identity, state.config.monthly_credits).await?;
    let ticket = state
        .store
        .create_ticket(user.id, request.subject.trim(), request.message.trim())
        .await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

/// GET /api/v1/tickets
pub async fn handle_list_tickets(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<Json<Vec<TicketRow>>, AppError> {
    let user = load_user(state.store.as_ref(), &identity, state.config.monthly_credits).await?;
    Ok(Json(state.store.list_tickets(user.id).await?))
}
