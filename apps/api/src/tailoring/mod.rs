// Resume tailoring: prompt → completion → parse → normalize → persist → charge.
// All completion calls go through llm_client::CompletionService.

pub mod handlers;
pub mod header;
pub mod normalize;
pub mod orchestrator;
pub mod parser;
pub mod prompts;

use serde::{Deserialize, Serialize};

/// Normalized tailoring output, as persisted on a job and returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TailoredDocument {
    pub tailored_resume: String,
    pub cover_letter: String,
    pub ats_score: i32,
}
