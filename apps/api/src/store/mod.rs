//! Persistence: every read and write of users, jobs, and engagement records.
//!
//! `AppState` holds an `Arc<dyn TailorStore>`. `PgStore` is the production
//! backend; `memory::MemoryStore` backs unit tests.
//!
//! Each method is independently atomic. The two `commit_*` methods write the
//! tailored results and consume the credit (or the anonymous free use) as one
//! unit: if nothing is left to consume, nothing is written.

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use uuid::Uuid;

use crate::auth::Identity;
use crate::errors::AppError;
use crate::models::engagement::{
    DashboardStats, NewTestimonial, TestimonialRow, TicketRow, TicketStatus, WaitlistRow,
};
use crate::models::job::{AnonymousJobRow, JobRow, NewJob};
use crate::models::user::{AnonymousSessionRow, UserRow};
use crate::tailoring::TailoredDocument;

#[cfg(test)]
pub mod memory;
pub mod postgres;

/// Result of trying to store tailored output and pay for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreditCommit {
    /// Results written, one credit consumed. Holds the remaining balance
    /// (always 0 for anonymous sessions).
    Committed { remaining_credits: i32 },
    /// No credit (or free use) left; nothing was written.
    Insufficient,
}

#[async_trait]
pub trait TailorStore: Send + Sync {
    // ── users ───────────────────────────────────────────────────────────────

    /// Loads the user for an identity, creating it with `initial_credits` on first access.
    async fn find_or_create_user(
        &self,
        identity: &Identity,
        initial_credits: i32,
    ) -> Result<UserRow, AppError>;

    /// Restores the balance to `credits` if `credits_reset_at` lies in an earlier
    /// calendar month than `now`. Returns the current row either way.
    async fn reset_credits_if_due(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
        credits: i32,
    ) -> Result<UserRow, AppError>;

    // ── jobs ────────────────────────────────────────────────────────────────

    async fn create_job(&self, user_id: Uuid, job: NewJob) -> Result<JobRow, AppError>;

    /// Owner-scoped lookup: a job owned by someone else is `None`.
    async fn find_job(&self, job_id: Uuid, user_id: Uuid) -> Result<Option<JobRow>, AppError>;

    /// Owner's jobs, newest first.
    async fn list_jobs(&self, user_id: Uuid) -> Result<Vec<JobRow>, AppError>;

    async fn delete_job(&self, job_id: Uuid, user_id: Uuid) -> Result<bool, AppError>;

    /// Writes the three tailored fields onto the job, then consumes one credit.
    async fn commit_tailoring(
        &self,
        job_id: Uuid,
        user_id: Uuid,
        document: &TailoredDocument,
    ) -> Result<CreditCommit, AppError>;

    // ── anonymous ───────────────────────────────────────────────────────────

    async fn create_anonymous_session(&self) -> Result<AnonymousSessionRow, AppError>;

    async fn find_anonymous_session(
        &self,
        session_id: Uuid,
    ) -> Result<Option<AnonymousSessionRow>, AppError>;

    async fn create_anonymous_job(
        &self,
        session_id: Uuid,
        job: NewJob,
    ) -> Result<AnonymousJobRow, AppError>;

    async fn find_anonymous_job(
        &self,
        job_id: Uuid,
        session_id: Uuid,
    ) -> Result<Option<AnonymousJobRow>, AppError>;

    /// Writes the tailored fields and claims the session's single free use.
    async fn commit_anonymous_tailoring(
        &self,
        job_id: Uuid,
        session_id: Uuid,
        document: &TailoredDocument,
    ) -> Result<CreditCommit, AppError>;

    // ── engagement ──────────────────────────────────────────────────────────

    /// Adds an email to the waitlist. Returns `false` if it was already there.
    async fn join_waitlist(&self, email: &str) -> Result<bool, AppError>;

    async fn list_waitlist(&self) -> Result<Vec<WaitlistRow>, AppError>;

    async fn create_testimonial(
        &self,
        user_id: Uuid,
        testimonial: NewTestimonial,
    ) -> Result<TestimonialRow, AppError>;

    async fn list_approved_testimonials(&self) -> Result<Vec<TestimonialRow>, AppError>;

    async fn set_testimonial_approved(
        &self,
        testimonial_id: Uuid,
        approved: bool,
    ) -> Result<Option<TestimonialRow>, AppError>;

    async fn create_ticket(
        &self,
        user_id: Uuid,
        subject: &str,
        message: &str,
    ) -> Result<TicketRow, AppError>;

    async fn list_tickets(&self, user_id: Uuid) -> Result<Vec<TicketRow>, AppError>;

    async fn update_ticket_status(
        &self,
        ticket_id: Uuid,
        status: TicketStatus,
    ) -> Result<Option<TicketRow>, AppError>;

    async fn dashboard_stats(&self) -> Result<DashboardStats, AppError>;
}

/// Loads (or creates) the caller's user row with any due monthly reset applied.
pub async fn load_user(
    store: &dyn TailorStore,
    identity: &Identity,
    monthly_credits: i32,
) -> Result<UserRow, AppError> {
    let user = store.find_or_create_user(identity, monthly_credits).await?;
    store
        .reset_credits_if_due(user.id, Utc::now(), monthly_credits)
        .await
}

/// True when `now` falls in a later calendar month (UTC) than `last_reset`.
pub fn monthly_reset_due(last_reset: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    (now.year(), now.month()) > (last_reset.year(), last_reset.month())
}
