use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A persisted tailoring job. The three tailored fields are written together
/// by a single successful tailoring run, so they are either all set or all null.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct JobRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub job_description: String,
    pub original_resume: String,
    pub tailored_resume: Option<String>,
    pub cover_letter: Option<String>,
    pub ats_score: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobRow {
    pub fn is_tailored(&self) -> bool {
        self.tailored_resume.is_some()
    }
}

/// A job submitted without an account, owned by an anonymous session.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AnonymousJobRow {
    pub id: Uuid,
    pub session_id: Uuid,
    pub job_description: String,
    pub original_resume: String,
    pub tailored_resume: Option<String>,
    pub cover_letter: Option<String>,
    pub ats_score: Option<i32>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating either kind of job.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub job_description: String,
    pub original_resume: String,
}
