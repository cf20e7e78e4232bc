//! Admin API. Every handler takes `AdminUser`, which requires a valid token
//! whose email is listed in `ADMIN_EMAILS`.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::auth::AdminUser;
use crate::errors::AppError;
use crate::models::engagement::{DashboardStats, TestimonialRow, TicketRow, TicketStatus, WaitlistRow};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ApprovalRequest {
    pub approved: bool,
}

#[derive(Debug, Deserialize)]
pub struct TicketStatusRequest {
    pub status: TicketStatus,
}

/// GET /api/v1/admin/stats
pub async fn handle_stats(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<DashboardStats>, AppError> {
    Ok(Json(state.store.dashboard_stats().await?))
}

/// GET /api/v1/admin/waitlist
pub async fn handle_list_waitlist(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<WaitlistRow>>, AppError> {
    Ok(Json(state.store.list_waitlist().await?))
}

/// PATCH /api/v1/admin/testimonials/:id
pub async fn handle_set_testimonial_approval(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(testimonial_id): Path<Uuid>,
    Json(request): Json<ApprovalRequest>,
) -> Result<Json<TestimonialRow>, AppError> {
    let row = state
        .store
        .set_testimonial_approved(testimonial_id, request.approved)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Testimonial {testimonial_id} not found")))?;
    info!(
        "Admin {} set testimonial {} approved={}",
        admin.email, testimonial_id, request.approved
    );
    Ok(Json(row))
}

/// PATCH /api/v1/admin/tickets/:id
pub async fn handle_update_ticket_status(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(ticket_id): Path<Uuid>,
    Json(request): Json<TicketStatusRequest>,
) -> Result<Json<TicketRow>, AppError> {
    let row = state
        .store
        .update_ticket_status(ticket_id, request.status)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Ticket {ticket_id} not found")))?;
    info!(
        "Admin {} moved ticket {} to {}",
        admin.email,
        ticket_id,
        request.status.as_str()
    );
    Ok(Json(row))
}
