use std::sync::Arc;

use crate::auth::{CredentialService, TokenService};
use crate::resumes::ResumeService;

/// Shared application state injected into all route handlers via Axum extractors.
/// Every component receives its collaborators at construction; nothing is ambient.
#[derive(Clone)]
pub struct AppState {
    pub credentials: Arc<CredentialService>,
    pub tokens: Arc<TokenService>,
    pub resumes: Arc<ResumeService>,
}

#[cfg(test)]
impl AppState {
    /// In-memory state with a fixed clock and the cheapest bcrypt cost.
    pub fn for_tests(clock: Arc<crate::clock::FixedClock>) -> Self {
        use crate::store::MemoryStore;

        let store = Arc::new(MemoryStore::new());
        Self {
            credentials: Arc::new(CredentialService::new(store.clone(), clock.clone(), 4)),
            tokens: Arc::new(TokenService::new(
                &[42u8; 64],
                chrono::Duration::hours(24),
                clock.clone(),
            )),
            resumes: Arc::new(ResumeService::new(store, clock)),
        }
    }
}
