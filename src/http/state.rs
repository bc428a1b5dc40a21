use crate::identity::IdentityResolver;
use crate::session::{Orchestrator, SessionService};
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub identity: Arc<dyn IdentityResolver>,
}

impl AppState {
    pub fn new(orchestrator: Arc<Orchestrator>, identity: Arc<dyn IdentityResolver>) -> Self {
        Self {
            orchestrator,
            identity,
        }
    }

    pub fn service(&self) -> &Arc<SessionService> {
        self.orchestrator.service()
    }
}
