use crate::config::Environment;
use crate::port::SocialStore;
use std::sync::Arc;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SocialStore>,
    /// Length of correlation tokens minted for requests without one.
    pub correlation_id_length: usize,
}

impl AppState {
    #[must_use]
    pub fn new(store: Arc<dyn SocialStore>, environment: Environment) -> Self {
        Self {
            store,
            correlation_id_length: environment.correlation_id_length(),
        }
    }
}
