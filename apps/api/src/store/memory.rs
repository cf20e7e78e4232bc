//! In-memory `TailorStore` for unit tests. A single mutex guards all tables,
//! so every method is atomic the same way the Postgres statements are.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::auth::Identity;
use crate::errors::AppError;
use crate::models::engagement::{
    DashboardStats, NewTestimonial, TestimonialRow, TicketRow, TicketStatus, WaitlistRow,
};
use crate::models::job::{AnonymousJobRow, JobRow, NewJob};
use crate::models::user::{AnonymousSessionRow, UserRow};
use crate::store::{monthly_reset_due, CreditCommit, TailorStore};
use crate::tailoring::TailoredDocument;

#[derive(Default)]
struct Tables {
    users: Vec<UserRow>,
    jobs: Vec<JobRow>,
    sessions: Vec<AnonymousSessionRow>,
    anonymous_jobs: Vec<AnonymousJobRow>,
    waitlist: Vec<WaitlistRow>,
    testimonials: Vec<TestimonialRow>,
    tickets: Vec<TicketRow>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites a user's balance and reset timestamp.
    pub fn set_credits(&self, user_id: Uuid, credits: i32, reset_at: DateTime<Utc>) {
        let mut t = self.tables.lock().unwrap();
        if let Some(user) = t.users.iter_mut().find(|u| u.id == user_id) {
            user.credits = credits;
            user.credits_reset_at = reset_at;
        }
    }

    pub fn user_by_external_id(&self, external_id: &str) -> Option<UserRow> {
        let t = self.tables.lock().unwrap();
        t.users.iter().find(|u| u.external_id == external_id).cloned()
    }

    pub fn job(&self, job_id: Uuid) -> Option<JobRow> {
        let t = self.tables.lock().unwrap();
        t.jobs.iter().find(|j| j.id == job_id).cloned()
    }

    pub fn testimonials(&self) -> Vec<TestimonialRow> {
        self.tables.lock().unwrap().testimonials.clone()
    }
}

#[async_trait]
impl TailorStore for MemoryStore {
    async fn find_or_create_user(
        &self,
        identity: &Identity,
        initial_credits: i32,
    ) -> Result<UserRow, AppError> {
        let mut t = self.tables.lock().unwrap();
        if let Some(user) = t
            .users
            .iter_mut()
            .find(|u| u.external_id == identity.user_id)
        {
            user.email = identity.email.clone();
            return Ok(user.clone());
        }
        let now = Utc::now();
        let user = UserRow {
            id: Uuid::new_v4(),
            external_id: identity.user_id.clone(),
            email: identity.email.clone(),
            credits: initial_credits,
            credits_reset_at: now,
            created_at: now,
        };
        t.users.push(user.clone());
        Ok(user)
    }

    async fn reset_credits_if_due(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
        credits: i32,
    ) -> Result<UserRow, AppError> {
        let mut t = self.tables.lock().unwrap();
        let user = t
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))?;
        if monthly_reset_due(user.credits_reset_at, now) {
            user.credits = credits;
            user.credits_reset_at = now;
        }
        Ok(user.clone())
    }

    async fn create_job(&self, user_id: Uuid, job: NewJob) -> Result<JobRow, AppError> {
        let now = Utc::now();
        let row = JobRow {
            id: Uuid::new_v4(),
            user_id,
            job_description: job.job_description,
            original_resume: job.original_resume,
            tailored_resume: None,
            cover_letter: None,
            ats_score: None,
            created_at: now,
            updated_at: now,
        };
        self.tables.lock().unwrap().jobs.push(row.clone());
        Ok(row)
    }

    async fn find_job(&self, job_id: Uuid, user_id: Uuid) -> Result<Option<JobRow>, AppError> {
        let t = self.tables.lock().unwrap();
        Ok(t.jobs
            .iter()
            .find(|j| j.id == job_id && j.user_id == user_id)
            .cloned())
    }

    async fn list_jobs(&self, user_id: Uuid) -> Result<Vec<JobRow>, AppError> {
        let t = self.tables.lock().unwrap();
        // Insertion order is creation order; newest first.
        Ok(t.jobs
            .iter()
            .rev()
            .filter(|j| j.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn delete_job(&self, job_id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        let mut t = self.tables.lock().unwrap();
        let before = t.jobs.len();
        t.jobs.retain(|j| !(j.id == job_id && j.user_id == user_id));
        Ok(t.jobs.len() < before)
    }

    async fn commit_tailoring(
        &self,
        job_id: Uuid,
        user_id: Uuid,
        document: &TailoredDocument,
    ) -> Result<CreditCommit, AppError> {
        let mut t = self.tables.lock().unwrap();
        if !t.jobs.iter().any(|j| j.id == job_id && j.user_id == user_id) {
            return Err(AppError::NotFound(format!("Job {job_id} not found")));
        }
        let Some(user) = t.users.iter_mut().find(|u| u.id == user_id) else {
            return Err(AppError::NotFound(format!("User {user_id} not found")));
        };
        if user.credits <= 0 {
            return Ok(CreditCommit::Insufficient);
        }
        user.credits -= 1;
        let remaining_credits = user.credits;

        if let Some(job) = t
            .jobs
            .iter_mut()
            .find(|j| j.id == job_id && j.user_id == user_id)
        {
            job.tailored_resume = Some(document.tailored_resume.clone());
            job.cover_letter = Some(document.cover_letter.clone());
            job.ats_score = Some(document.ats_score);
            job.updated_at = Utc::now();
        }
        Ok(CreditCommit::Committed { remaining_credits })
    }

    async fn create_anonymous_session(&self) -> Result<AnonymousSessionRow, AppError> {
        let row = AnonymousSessionRow {
            id: Uuid::new_v4(),
            used_free_credit: false,
            created_at: Utc::now(),
        };
        self.tables.lock().unwrap().sessions.push(row.clone());
        Ok(row)
    }

    async fn find_anonymous_session(
        &self,
        session_id: Uuid,
    ) -> Result<Option<AnonymousSessionRow>, AppError> {
        let t = self.tables.lock().unwrap();
        Ok(t.sessions.iter().find(|s| s.id == session_id).cloned())
    }

    async fn create_anonymous_job(
        &self,
        session_id: Uuid,
        job: NewJob,
    ) -> Result<AnonymousJobRow, AppError> {
        let row = AnonymousJobRow {
            id: Uuid::new_v4(),
            session_id,
            job_description: job.job_description,
            original_resume: job.original_resume,
            tailored_resume: None,
            cover_letter: None,
            ats_score: None,
            created_at: Utc::now(),
        };
        self.tables.lock().unwrap().anonymous_jobs.push(row.clone());
        Ok(row)
    }

    async fn find_anonymous_job(
        &self,
        job_id: Uuid,
        session_id: Uuid,
    ) -> Result<Option<AnonymousJobRow>, AppError> {
        let t = self.tables.lock().unwrap();
        Ok(t.anonymous_jobs
            .iter()
            .find(|j| j.id == job_id && j.session_id == session_id)
            .cloned())
    }

    async fn commit_anonymous_tailoring(
        &self,
        job_id: Uuid,
        session_id: Uuid,
        document: &TailoredDocument,
    ) -> Result<CreditCommit, AppError> {
        let mut t = self.tables.lock().unwrap();
        if !t
            .anonymous_jobs
            .iter()
            .any(|j| j.id == job_id && j.session_id == session_id)
        {
            return Err(AppError::NotFound(format!("Job {job_id} not found")));
        }
        let Some(session) = t.sessions.iter_mut().find(|s| s.id == session_id) else {
            return Err(AppError::NotFound(format!("Session {session_id} not found")));
        };
        if session.used_free_credit {
            return Ok(CreditCommit::Insufficient);
        }
        session.used_free_credit = true;

        if let Some(job) = t
            .anonymous_jobs
            .iter_mut()
            .find(|j| j.id == job_id && j.session_id == session_id)
        {
            job.tailored_resume = Some(document.tailored_resume.clone());
            job.cover_letter = Some(document.cover_letter.clone());
            job.ats_score = Some(document.ats_score);
        }
        Ok(CreditCommit::Committed {
            remaining_credits: 0,
        })
    }

    async fn join_waitlist(&self, email: &str) -> Result<bool, AppError> {
        let mut t = self.tables.lock().unwrap();
        if t.waitlist.iter().any(|w| w.email == email) {
            return Ok(false);
        }
        t.waitlist.push(WaitlistRow {
            email: email.to_string(),
            created_at: Utc::now(),
        });
        Ok(true)
    }

    async fn list_waitlist(&self) -> Result<Vec<WaitlistRow>, AppError> {
        let t = self.tables.lock().unwrap();
        Ok(t.waitlist.iter().rev().cloned().collect())
    }

    async fn create_testimonial(
        &self,
        user_id: Uuid,
        testimonial: NewTestimonial,
    ) -> Result<TestimonialRow, AppError> {
        let row = TestimonialRow {
            id: Uuid::new_v4(),
            user_id,
            name: testimonial.name,
            role: testimonial.role,
            content: testimonial.content,
            rating: testimonial.rating,
            approved: false,
            created_at: Utc::now(),
        };
        self.tables.lock().unwrap().testimonials.push(row.clone());
        Ok(row)
    }

    async fn list_approved_testimonials(&self) -> Result<Vec<TestimonialRow>, AppError> {
        let t = self.tables.lock().unwrap();
        Ok(t.testimonials
            .iter()
            .rev()
            .filter(|r| r.approved)
            .cloned()
            .collect())
    }

    async fn set_testimonial_approved(
        &self,
        testimonial_id: Uuid,
        approved: bool,
    ) -> Result<Option<TestimonialRow>, AppError> {
        let mut t = self.tables.lock().unwrap();
        Ok(t.testimonials
            .iter_mut()
            .find(|r| r.id == testimonial_id)
            .map(|r| {
                r.approved = approved;
                r.clone()
            }))
    }

    async fn create_ticket(
        &self,
        user_id: Uuid,
        subject: &str,
        message: &str,
    ) -> Result<TicketRow, AppError> {
        let now = Utc::now();
        let row = TicketRow {
            id: Uuid::new_v4(),
            user_id,
            subject: subject.to_string(),
            message: message.to_string(),
            status: TicketStatus::Open.as_str().to_string(),
            created_at: now,
            updated_at: now,
        };
        self.tables.lock().unwrap().tickets.push(row.clone());
        Ok(row)
    }

    async fn list_tickets(&self, user_id: Uuid) -> Result<Vec<TicketRow>, AppError> {
        let t = self.tables.lock().unwrap();
        Ok(t.tickets
            .iter()
            .rev()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn update_ticket_status(
        &self,
        ticket_id: Uuid,
        status: TicketStatus,
    ) -> Result<Option<TicketRow>, AppError> {
        let mut t = self.tables.lock().unwrap();
        Ok(t.tickets.iter_mut().find(|r| r.id == ticket_id).map(|r| {
            r.status = status.as_str().to_string();
            r.updated_at = Utc::now();
            r.clone()
        }))
    }

    async fn dashboard_stats(&self) -> Result<DashboardStats, AppError> {
        let t = self.tables.lock().unwrap();
        Ok(DashboardStats {
            users: t.users.len() as i64,
            jobs: t.jobs.len() as i64,
            tailored_jobs: t.jobs.iter().filter(|j| j.is_tailored()).count() as i64,
            anonymous_jobs: t.anonymous_jobs.len() as i64,
            waitlist: t.waitlist.len() as i64,
            open_tickets: t
                .tickets
                .iter()
                .filter(|r| r.status != TicketStatus::Closed.as_str())
                .count() as i64,
        })
    }
}
