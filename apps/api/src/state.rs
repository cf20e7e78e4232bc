use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::CompletionService;
use crate::store::TailorStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Persistence for users, jobs, and engagement records. Postgres in production.
    pub store: Arc<dyn TailorStore>,
    /// Text-completion service. `LlmClient` in production.
    pub llm: Arc<dyn CompletionService>,
    pub config: Config,
}
