//! Tailoring Orchestrator: runs one tailoring request end to end.
//!
//! Stages, in order:
//! `Authorizing → Loading → CreditCheck → Prompting → AwaitingAiResponse →
//!  Parsing → Normalizing → Persisting → DeductingCredit → Done`.
//! Any stage may fail; the failure is logged with the stage name and returned.
//!
//! Results are written and the credit consumed in one store commit, after
//! everything else has succeeded. A failure at any earlier stage leaves the
//! job and the balance untouched. There are no retries: the caller resubmits.

use std::fmt;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::auth::Identity;
use crate::errors::AppError;
use crate::llm_client::CompletionService;
use crate::store::{load_user, CreditCommit, TailorStore};
use crate::tailoring::normalize::{normalize_cover_letter_text, normalize_resume_text};
use crate::tailoring::parser::parse_ai_output;
use crate::tailoring::prompts::{build_tailor_prompt, tailor_system};
use crate::tailoring::TailoredDocument;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TailorStage {
    Authorizing,
    Loading,
    CreditCheck,
    Prompting,
    AwaitingAiResponse,
    Parsing,
    Normalizing,
    Persisting,
    DeductingCredit,
    Done,
}

impl fmt::Display for TailorStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TailorStage::Authorizing => "authorizing",
            TailorStage::Loading => "loading",
            TailorStage::CreditCheck => "credit_check",
            TailorStage::Prompting => "prompting",
            TailorStage::AwaitingAiResponse => "awaiting_ai_response",
            TailorStage::Parsing => "parsing",
            TailorStage::Normalizing => "normalizing",
            TailorStage::Persisting => "persisting",
            TailorStage::DeductingCredit => "deducting_credit",
            TailorStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Successful tailoring result.
#[derive(Debug, Clone)]
pub struct TailorOutcome {
    pub document: TailoredDocument,
    pub remaining_credits: i32,
}

/// Tracks the current stage of one run for logging.
struct TailorRun {
    job_id: Uuid,
    stage: TailorStage,
}

impl TailorRun {
    fn new(job_id: Uuid) -> Self {
        Self {
            job_id,
            stage: TailorStage::Authorizing,
        }
    }

    fn enter(&mut self, stage: TailorStage) {
        debug!("Tailoring job {}: {} → {}", self.job_id, self.stage, stage);
        self.stage = stage;
    }

    fn fail(&self, err: AppError) -> AppError {
        warn!(
            "Tailoring job {} failed at stage {}: {}",
            self.job_id, self.stage, err
        );
        err
    }
}

/// Tailors a job owned by an authenticated user and charges one credit.
pub async fn tailor_job(
    store: &dyn TailorStore,
    llm: &dyn CompletionService,
    monthly_credits: i32,
    identity: Option<&Identity>,
    job_id: Uuid,
) -> Result<TailorOutcome, AppError> {
    let mut run = TailorRun::new(job_id);

    let identity = identity.ok_or_else(|| run.fail(AppError::Unauthorized))?;

    run.enter(TailorStage::Loading);
    let user = load_user(store, identity, monthly_credits)
        .await
        .map_err(|e| run.fail(e))?;
    // A job owned by someone else is reported exactly like a missing one.
    let job = store
        .find_job(job_id, user.id)
        .await
        .map_err(|e| run.fail(e))?
        .ok_or_else(|| run.fail(AppError::NotFound(format!("Job {job_id} not found"))))?;

    run.enter(TailorStage::CreditCheck);
    if user.credits <= 0 {
        return Err(run.fail(AppError::PaymentRequired));
    }

    let document = generate(&mut run, llm, &job.job_description, &job.original_resume).await?;

    run.enter(TailorStage::Persisting);
    let commit = store
        .commit_tailoring(job_id, user.id, &document)
        .await
        .map_err(|e| run.fail(e))?;

    run.enter(TailorStage::DeductingCredit);
    let remaining_credits = match commit {
        CreditCommit::Committed { remaining_credits } => remaining_credits,
        // Another request spent the last credit between our check and commit.
        CreditCommit::Insufficient => return Err(run.fail(AppError::PaymentRequired)),
    };

    run.enter(TailorStage::Done);
    info!(
        "Tailored job {} for user {} (ats_score={}, credits left={})",
        job_id, user.id, document.ats_score, remaining_credits
    );

    Ok(TailorOutcome {
        document,
        remaining_credits,
    })
}

/// Tailors a job created without an account, consuming the session's single free use.
pub async fn tailor_anonymous_job(
    store: &dyn TailorStore,
    llm: &dyn CompletionService,
    session_id: Option<Uuid>,
    job_id: Uuid,
) -> Result<TailorOutcome, AppError> {
    let mut run = TailorRun::new(job_id);

    let session_id = session_id.ok_or_else(|| run.fail(AppError::Unauthorized))?;

    run.enter(TailorStage::Loading);
    let session = store
        .find_anonymous_session(session_id)
        .await
        .map_err(|e| run.fail(e))?
        .ok_or_else(|| run.fail(AppError::NotFound("Session not found".to_string())))?;
    let job = store
        .find_anonymous_job(job_id, session.id)
        .await
        .map_err(|e| run.fail(e))?
        .ok_or_else(|| run.fail(AppError::NotFound(format!("Job {job_id} not found"))))?;

    run.enter(TailorStage::CreditCheck);
    if session.used_free_credit {
        return Err(run.fail(AppError::PaymentRequired));
    }

    let document = generate(&mut run, llm, &job.job_description, &job.original_resume).await?;

    run.enter(TailorStage::Persisting);
    let commit = store
        .commit_anonymous_tailoring(job_id, session.id, &document)
        .await
        .map_err(|e| run.fail(e))?;

    run.enter(TailorStage::DeductingCredit);
    if commit == CreditCommit::Insufficient {
        return Err(run.fail(AppError::PaymentRequired));
    }

    run.enter(TailorStage::Done);
    info!("Tailored anonymous job {} for session {}", job_id, session.id);

    Ok(TailorOutcome {
        document,
        remaining_credits: 0,
    })
}

/// Prompting → AwaitingAiResponse → Parsing → Normalizing. Touches no state.
async fn generate(
    run: &mut TailorRun,
    llm: &dyn CompletionService,
    job_description: &str,
    resume: &str,
) -> Result<TailoredDocument, AppError> {
    run.enter(TailorStage::Prompting);
    let prompt = build_tailor_prompt(job_description, resume);
    let system = tailor_system();

    run.enter(TailorStage::AwaitingAiResponse);
    let raw = llm
        .complete(&prompt, &system)
        .await
        .map_err(|e| run.fail(e.into()))?;

    run.enter(TailorStage::Parsing);
    let parsed = parse_ai_output(&raw).map_err(|e| run.fail(e.into()))?;

    run.enter(TailorStage::Normalizing);
    Ok(TailoredDocument {
        tailored_resume: normalize_resume_text(&parsed.tailored_resume),
        cover_letter: normalize_cover_letter_text(&parsed.cover_letter),
        ats_score: parsed.ats_score,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::scripted::ScriptedCompletion;
    use crate::models::job::NewJob;
    use crate::store::memory::MemoryStore;
    use chrono::{Datelike, Duration, TimeZone, Utc};

    const RESUME: &str = "John Smith\nEmail: john@x.com\n\nSKILLS\nPython, Go, SQL";
    const AI_OUTPUT: &str = r#"{"tailoredResume":"JOHN SMITH\n\nSKILLS\nPython, Go, SQL","coverLetter":"Dear Hiring Manager,...","atsScore":92}"#;

    fn identity() -> Identity {
        Identity {
            user_id: "user_1".to_string(),
            email: "john@x.com".to_string(),
        }
    }

    /// Creates the user with `credits` and one untailored job.
    async fn seed(store: &MemoryStore, credits: i32) -> (Uuid, Uuid) {
        let user = store.find_or_create_user(&identity(), 3).await.unwrap();
        store.set_credits(user.id, credits, Utc::now());
        let job = store
            .create_job(
                user.id,
                NewJob {
                    job_description: "Backend engineer, Go and SQL".to_string(),
                    original_resume: RESUME.to_string(),
                },
            )
            .await
            .unwrap();
        (user.id, job.id)
    }

    #[tokio::test]
    async fn test_end_to_end_keeps_skills_line() {
        let store = MemoryStore::new();
        let llm = ScriptedCompletion::always(AI_OUTPUT);
        let (user_id, job_id) = seed(&store, 2).await;

        let outcome = tailor_job(&store, &llm, 3, Some(&identity()), job_id)
            .await
            .unwrap();

        assert!(outcome
            .document
            .tailored_resume
            .contains("SKILLS\nPython, Go, SQL"));
        assert_eq!(outcome.document.cover_letter, "Dear Hiring Manager,...");
        assert_eq!(outcome.document.ats_score, 92);
        assert_eq!(outcome.remaining_credits, 1);

        let job = store.job(job_id).unwrap();
        assert_eq!(job.user_id, user_id);
        assert_eq!(
            job.tailored_resume.as_deref(),
            Some(outcome.document.tailored_resume.as_str())
        );
        assert_eq!(job.ats_score, Some(92));
    }

    #[tokio::test]
    async fn test_prompt_embeds_job_and_resume() {
        let store = MemoryStore::new();
        let llm = ScriptedCompletion::always(AI_OUTPUT);
        let (_, job_id) = seed(&store, 1).await;

        tailor_job(&store, &llm, 3, Some(&identity()), job_id)
            .await
            .unwrap();

        let prompts = llm.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Backend engineer, Go and SQL"));
        assert!(prompts[0].contains(RESUME));
    }

    #[tokio::test]
    async fn test_missing_identity_is_unauthorized_without_ai_call() {
        let store = MemoryStore::new();
        let llm = ScriptedCompletion::always(AI_OUTPUT);
        let (_, job_id) = seed(&store, 1).await;

        let err = tailor_job(&store, &llm, 3, None, job_id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized));
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_job_of_another_user_is_not_found() {
        let store = MemoryStore::new();
        let llm = ScriptedCompletion::always(AI_OUTPUT);
        let (_, job_id) = seed(&store, 1).await;

        let intruder = Identity {
            user_id: "user_2".to_string(),
            email: "eve@x.com".to_string(),
        };
        let err = tailor_job(&store, &llm, 3, Some(&intruder), job_id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_no_credits_is_payment_required_without_ai_call() {
        let store = MemoryStore::new();
        let llm = ScriptedCompletion::always(AI_OUTPUT);
        let (_, job_id) = seed(&store, 0).await;

        let err = tailor_job(&store, &llm, 3, Some(&identity()), job_id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::PaymentRequired));
        assert_eq!(llm.call_count(), 0);
        assert!(store.job(job_id).unwrap().tailored_resume.is_none());
    }

    #[tokio::test]
    async fn test_upstream_failure_leaves_job_and_credits_unchanged() {
        let store = MemoryStore::new();
        let llm = ScriptedCompletion::failing();
        let (_, job_id) = seed(&store, 1).await;

        let err = tailor_job(&store, &llm, 3, Some(&identity()), job_id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
        assert!(store.job(job_id).unwrap().tailored_resume.is_none());
        assert_eq!(store.user_by_external_id("user_1").unwrap().credits, 1);
    }

    #[tokio::test]
    async fn test_parse_failure_leaves_job_and_credits_unchanged() {
        let store = MemoryStore::new();
        let llm = ScriptedCompletion::always("I cannot help with that request.");
        let (_, job_id) = seed(&store, 1).await;

        let err = tailor_job(&store, &llm, 3, Some(&identity()), job_id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Parse(_)));
        assert!(store.job(job_id).unwrap().tailored_resume.is_none());
        assert_eq!(store.user_by_external_id("user_1").unwrap().credits, 1);
    }

    #[tokio::test]
    async fn test_concurrent_requests_with_one_credit() {
        let store = MemoryStore::new();
        let llm = ScriptedCompletion::always(AI_OUTPUT);
        let (_, job_id) = seed(&store, 1).await;
        let id = identity();

        let (a, b) = tokio::join!(
            tailor_job(&store, &llm, 3, Some(&id), job_id),
            tailor_job(&store, &llm, 3, Some(&id), job_id),
        );

        let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
        let payment_required = [&a, &b]
            .iter()
            .filter(|r| matches!(r, Err(AppError::PaymentRequired)))
            .count();
        assert_eq!(successes, 1);
        assert_eq!(payment_required, 1);
        assert_eq!(store.user_by_external_id("user_1").unwrap().credits, 0);
    }

    #[tokio::test]
    async fn test_monthly_reset_applies_before_credit_check() {
        let store = MemoryStore::new();
        let llm = ScriptedCompletion::always(AI_OUTPUT);
        let (user_id, job_id) = seed(&store, 0).await;
        let last_month = Utc::now() - Duration::days(40);
        store.set_credits(user_id, 0, last_month);

        let outcome = tailor_job(&store, &llm, 3, Some(&identity()), job_id)
            .await
            .unwrap();
        assert_eq!(outcome.remaining_credits, 2);
    }

    #[tokio::test]
    async fn test_no_reset_within_same_month() {
        let store = MemoryStore::new();
        let llm = ScriptedCompletion::always(AI_OUTPUT);
        let (user_id, job_id) = seed(&store, 0).await;
        let now = Utc::now();
        let start_of_month = Utc
            .with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
            .unwrap();
        store.set_credits(user_id, 0, start_of_month);

        let err = tailor_job(&store, &llm, 3, Some(&identity()), job_id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::PaymentRequired));
    }

    #[tokio::test]
    async fn test_anonymous_session_gets_one_free_tailoring() {
        let store = MemoryStore::new();
        let llm = ScriptedCompletion::always(AI_OUTPUT);
        let session = store.create_anonymous_session().await.unwrap();
        let new_job = || NewJob {
            job_description: "Data engineer".to_string(),
            original_resume: RESUME.to_string(),
        };
        let first = store.create_anonymous_job(session.id, new_job()).await.unwrap();
        let second = store.create_anonymous_job(session.id, new_job()).await.unwrap();

        let outcome = tailor_anonymous_job(&store, &llm, Some(session.id), first.id)
            .await
            .unwrap();
        assert_eq!(outcome.document.ats_score, 92);

        let err = tailor_anonymous_job(&store, &llm, Some(session.id), second.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::PaymentRequired));
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn test_anonymous_without_session_is_unauthorized() {
        let store = MemoryStore::new();
        let llm = ScriptedCompletion::always(AI_OUTPUT);
        let err = tailor_anonymous_job(&store, &llm, None, Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized));
    }

    #[tokio::test]
    async fn test_anonymous_job_from_other_session_is_not_found() {
        let store = MemoryStore::new();
        let llm = ScriptedCompletion::always(AI_OUTPUT);
        let owner = store.create_anonymous_session().await.unwrap();
        let other = store.create_anonymous_session().await.unwrap();
        let job = store
            .create_anonymous_job(
                owner.id,
                NewJob {
                    job_description: "jd".to_string(),
                    original_resume: "cv".to_string(),
                },
            )
            .await
            .unwrap();

        let err = tailor_anonymous_job(&store, &llm, Some(other.id), job.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(TailorStage::AwaitingAiResponse.to_string(), "awaiting_ai_response");
        assert_eq!(TailorStage::DeductingCredit.to_string(), "deducting_credit");
    }
}
