//! Shared state for the HTTP handlers.

use std::sync::Arc;

use crate::assistant::orchestrator::Orchestrator;
use crate::assistant::store::ConversationStore;

/// Cloned into every handler by axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    /// Read side of the conversation store, for history listings.
    pub conversations: Arc<dyn ConversationStore>,
    /// Browser origins allowed by CORS.
    pub allowed_origins: Arc<Vec<String>>,
}

impl AppState {
    pub fn new(orchestrator: Arc<Orchestrator>, conversations: Arc<dyn ConversationStore>) -> Self {
        Self {
            orchestrator,
            conversations,
            allowed_origins: Arc::new(Vec::new()),
        }
    }

    pub fn with_allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.allowed_origins = Arc::new(origins);
        self
    }
}
