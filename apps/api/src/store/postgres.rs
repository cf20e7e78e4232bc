use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::Identity;
use crate::errors::AppError;
use crate::models::engagement::{
    DashboardStats, NewTestimonial, TestimonialRow, TicketRow, TicketStatus, WaitlistRow,
};
use crate::models::job::{AnonymousJobRow, JobRow, NewJob};
use crate::models::user::{AnonymousSessionRow, UserRow};
use crate::store::{CreditCommit, TailorStore};
use crate::tailoring::TailoredDocument;

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TailorStore for PgStore {
    async fn find_or_create_user(
        &self,
        identity: &Identity,
        initial_credits: i32,
    ) -> Result<UserRow, AppError> {
        // ON CONFLICT keeps the existing balance; only the email is refreshed.
        let user = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, external_id, email, credits, credits_reset_at)
            VALUES ($1, $2, $3, $4, NOW())
            ON CONFLICT (external_id) DO UPDATE SET email = EXCLUDED.email
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&identity.user_id)
        .bind(&identity.email)
        .bind(initial_credits)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn reset_credits_if_due(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
        credits: i32,
    ) -> Result<UserRow, AppError> {
        // The month comparison lives in the WHERE clause so two concurrent
        // first-of-month loads reset the balance once.
        let reset = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET credits = $2, credits_reset_at = $3
            WHERE id = $1
              AND date_trunc('month', credits_reset_at AT TIME ZONE 'UTC')
                < date_trunc('month', $3 AT TIME ZONE 'UTC')
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(credits)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(user) = reset {
            tracing::info!("Monthly credit reset for user {user_id}: {credits} credits");
            return Ok(user);
        }

        sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))
    }

    async fn create_job(&self, user_id: Uuid, job: NewJob) -> Result<JobRow, AppError> {
        let row = sqlx::query_as::<_, JobRow>(
            r#"
            INSERT INTO jobs (id, user_id, job_description, original_resume)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&job.job_description)
        .bind(&job.original_resume)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn find_job(&self, job_id: Uuid, user_id: Uuid) -> Result<Option<JobRow>, AppError> {
        let row = sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE id = $1 AND user_id = $2")
            .bind(job_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_jobs(&self, user_id: Uuid) -> Result<Vec<JobRow>, AppError> {
        let rows = sqlx::query_as::<_, JobRow>(
            "SELECT * FROM jobs WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn delete_job(&self, job_id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM jobs WHERE id = $1 AND user_id = $2")
            .bind(job_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn commit_tailoring(
        &self,
        job_id: Uuid,
        user_id: Uuid,
        document: &TailoredDocument,
    ) -> Result<CreditCommit, AppError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE jobs
            SET tailored_resume = $3, cover_letter = $4, ats_score = $5, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(job_id)
        .bind(user_id)
        .bind(&document.tailored_resume)
        .bind(&document.cover_letter)
        .bind(document.ats_score)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(AppError::NotFound(format!("Job {job_id} not found")));
        }

        // Conditional decrement: the row only matches while a credit remains.
        let remaining: Option<i32> = sqlx::query_scalar(
            "UPDATE users SET credits = credits - 1 WHERE id = $1 AND credits > 0 RETURNING credits",
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        match remaining {
            Some(remaining_credits) => {
                tx.commit().await?;
                Ok(CreditCommit::Committed { remaining_credits })
            }
            None => {
                tx.rollback().await?;
                Ok(CreditCommit::Insufficient)
            }
        }
    }

    async fn create_anonymous_session(&self) -> Result<AnonymousSessionRow, AppError> {
        let row = sqlx::query_as::<_, AnonymousSessionRow>(
            "INSERT INTO anonymous_sessions (id) VALUES ($1) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_anonymous_session(
        &self,
        session_id: Uuid,
    ) -> Result<Option<AnonymousSessionRow>, AppError> {
        let row = sqlx::query_as::<_, AnonymousSessionRow>(
            "SELECT * FROM anonymous_sessions WHERE id = $1",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn create_anonymous_job(
        &self,
        session_id: Uuid,
        job: NewJob,
    ) -> Result<AnonymousJobRow, AppError> {
        let row = sqlx::query_as::<_, AnonymousJobRow>(
            r#"
            INSERT INTO anonymous_jobs (id, session_id, job_description, original_resume)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(session_id)
        .bind(&job.job_description)
        .bind(&job.original_resume)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_anonymous_job(
        &self,
        job_id: Uuid,
        session_id: Uuid,
    ) -> Result<Option<AnonymousJobRow>, AppError> {
        let row = sqlx::query_as::<_, AnonymousJobRow>(
            "SELECT * FROM anonymous_jobs WHERE id = $1 AND session_id = $2",
        )
        .bind(job_id)
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn commit_anonymous_tailoring(
        &self,
        job_id: Uuid,
        session_id: Uuid,
        document: &TailoredDocument,
    ) -> Result<CreditCommit, AppError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE anonymous_jobs
            SET tailored_resume = $3, cover_letter = $4, ats_score = $5
            WHERE id = $1 AND session_id = $2
            "#,
        )
        .bind(job_id)
        .bind(session_id)
        .bind(&document.tailored_resume)
        .bind(&document.cover_letter)
        .bind(document.ats_score)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(AppError::NotFound(format!("Job {job_id} not found")));
        }

        let claimed = sqlx::query(
            "UPDATE anonymous_sessions SET used_free_credit = TRUE WHERE id = $1 AND used_free_credit = FALSE",
        )
        .bind(session_id)
        .execute(&mut *tx)
        .await?;

        if claimed.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(CreditCommit::Insufficient);
        }

        tx.commit().await?;
        Ok(CreditCommit::Committed {
            remaining_credits: 0,
        })
    }

    async fn join_waitlist(&self, email: &str) -> Result<bool, AppError> {
        let result =
            sqlx::query("INSERT INTO waitlist (email) VALUES ($1) ON CONFLICT (email) DO NOTHING")
                .bind(email)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_waitlist(&self) -> Result<Vec<WaitlistRow>, AppError> {
        let rows =
            sqlx::query_as::<_, WaitlistRow>("SELECT * FROM waitlist ORDER BY created_at DESC")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows)
    }

    async fn create_testimonial(
        &self,
        user_id: Uuid,
        testimonial: NewTestimonial,
    ) -> Result<TestimonialRow, AppError> {
        let row = sqlx::query_as::<_, TestimonialRow>(
            r#"
            INSERT INTO testimonials (id, user_id, name, role, content, rating)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&testimonial.name)
        .bind(&testimonial.role)
        .bind(&testimonial.content)
        .bind(testimonial.rating)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_approved_testimonials(&self) -> Result<Vec<TestimonialRow>, AppError> {
        let rows = sqlx::query_as::<_, TestimonialRow>(
            "SELECT * FROM testimonials WHERE approved ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn set_testimonial_approved(
        &self,
        testimonial_id: Uuid,
        approved: bool,
    ) -> Result<Option<TestimonialRow>, AppError> {
        let row = sqlx::query_as::<_, TestimonialRow>(
            "UPDATE testimonials SET approved = $2 WHERE id = $1 RETURNING *",
        )
        .bind(testimonial_id)
        .bind(approved)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn create_ticket(
        &self,
        user_id: Uuid,
        subject: &str,
        message: &str,
    ) -> Result<TicketRow, AppError> {
        let row = sqlx::query_as::<_, TicketRow>(
            r#"
            INSERT INTO support_tickets (id, user_id, subject, message, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(subject)
        .bind(message)
        .bind(TicketStatus::Open.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_tickets(&self, user_id: Uuid) -> Result<Vec<TicketRow>, AppError> {
        let rows = sqlx::query_as::<_, TicketRow>(
            "SELECT * FROM support_tickets WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn update_ticket_status(
        &self,
        ticket_id: Uuid,
        status: TicketStatus,
    ) -> Result<Option<TicketRow>, AppError> {
        let row = sqlx::query_as::<_, TicketRow>(
            "UPDATE support_tickets SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(ticket_id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn dashboard_stats(&self) -> Result<DashboardStats, AppError> {
        let (users, jobs, tailored_jobs, anonymous_jobs, waitlist, open_tickets): (
            i64,
            i64,
            i64,
            i64,
            i64,
            i64,
        ) = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users),
                (SELECT COUNT(*) FROM jobs),
                (SELECT COUNT(*) FROM jobs WHERE tailored_resume IS NOT NULL),
                (SELECT COUNT(*) FROM anonymous_jobs),
                (SELECT COUNT(*) FROM waitlist),
                (SELECT COUNT(*) FROM support_tickets WHERE status <> 'closed')
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(DashboardStats {
            users,
            jobs,
            tailored_jobs,
            anonymous_jobs,
            waitlist,
            open_tickets,
        })
    }
}
