use std::sync::Arc;

use crate::config::Config;
use crate::interview::orchestrator::InterviewOrchestrator;
use crate::llm_client::CompletionProxy;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Completion boundary. Also held by the orchestrator; the stateless turn
    /// endpoint calls it directly.
    pub llm: Arc<dyn CompletionProxy>,
    pub orchestrator: Arc<InterviewOrchestrator>,
    pub config: Config,
}
