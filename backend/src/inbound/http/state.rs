//! Shared application state wired into the HTTP layer.

use std::sync::Arc;

use crate::domain::{ContentCommand, ContentQuery, SessionService, TagSuggester};

/// Handles to the driving ports, shared across workers.
///
/// Handlers depend on trait objects rather than concrete services so the
/// same routes serve production adapters and test doubles alike.
#[derive(Clone)]
pub struct HttpState {
    pub queries: Arc<dyn ContentQuery>,
    pub commands: Arc<dyn ContentCommand>,
    pub sessions: Arc<dyn SessionService>,
    pub suggester: Arc<dyn TagSuggester>,
}

impl HttpState {
    /// Bundle the driving ports into shared state.
    pub fn new(
        queries: Arc<dyn ContentQuery>,
        commands: Arc<dyn ContentCommand>,
        sessions: Arc<dyn SessionService>,
        suggester: Arc<dyn TagSuggester>,
    ) -> Self {
        Self {
            queries,
            commands,
            sessions,
            suggester,
        }
    }
}
