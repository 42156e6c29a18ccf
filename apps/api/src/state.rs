use std::sync::Arc;

use crate::llm_client::LlmClient;
use crate::resume::live::ResumeFeed;
use crate::resume::store::ResumeStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Pluggable document store. PostgreSQL when DATABASE_URL is set, otherwise in-memory.
    pub store: Arc<dyn ResumeStore>,
    pub llm: LlmClient,
    /// Live subscriptions, one broadcast channel per subscribed user.
    pub feed: ResumeFeed,
}
