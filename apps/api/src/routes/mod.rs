pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
    Router,
};

use crate::admin;
use crate::engagement::handlers as engagement;
use crate::jobs::handlers as jobs;
use crate::render::handlers as render;
use crate::state::AppState;
use crate::tailoring::handlers as tailoring;

pub fn build_router(state: AppState) -> Router {
    let max_upload_bytes = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Jobs & tailoring
        .route(
            "/api/v1/jobs",
            get(jobs::handle_list_jobs).post(jobs::handle_create_job),
        )
        .route("/api/v1/jobs/upload", post(jobs::handle_upload_job))
        .route(
            "/api/v1/jobs/:id",
            get(jobs::handle_get_job).delete(jobs::handle_delete_job),
        )
        .route("/api/v1/jobs/:id/tailor", post(tailoring::handle_tailor_job))
        .route("/api/v1/jobs/:id/pdf", get(render::handle_job_pdf))
        .route("/api/v1/credits", get(tailoring::handle_get_credits))
        // Anonymous (one free tailoring per session)
        .route(
            "/api/v1/anonymous/sessions",
            post(tailoring::handle_create_anonymous_session),
        )
        .route(
            "/api/v1/anonymous/jobs",
            post(tailoring::handle_create_anonymous_job),
        )
        .route(
            "/api/v1/anonymous/jobs/upload",
            post(tailoring::handle_upload_anonymous_job),
        )
        .route(
            "/api/v1/anonymous/jobs/:id",
            get(tailoring::handle_get_anonymous_job),
        )
        .route(
            "/api/v1/anonymous/jobs/:id/tailor",
            post(tailoring::handle_tailor_anonymous_job),
        )
        // Rendering
        .route("/api/v1/templates", get(render::handle_list_templates))
        .route("/api/v1/render/preview", post(render::handle_render_preview))
        .route("/api/v1/render/download", post(render::handle_render_download))
        // Engagement
        .route("/api/v1/waitlist", post(engagement::handle_join_waitlist))
        .route(
            "/api/v1/testimonials",
            get(engagement::handle_list_testimonials).post(engagement::handle_create_testimonial),
        )
        .route(
            "/api/v1/tickets",
            get(engagement::handle_list_tickets).post(engagement::handle_create_ticket),
        )
        // Admin
        .route("/api/v1/admin/stats", get(admin::handle_stats))
        .route("/api/v1/admin/waitlist", get(admin::handle_list_waitlist))
        .route(
            "/api/v1/admin/testimonials/:id",
            patch(admin::handle_set_testimonial_approval),
        )
        .route(
            "/api/v1/admin/tickets/:id",
            patch(admin::handle_update_ticket_status),
        )
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}
