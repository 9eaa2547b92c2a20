//! Shared runtime application state (HTTP handlers)

use std::sync::Arc;
use uuid::Uuid;

use crate::router::IntelligentRouter;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<IntelligentRouter>,
}

impl AppState {
    pub fn new(router: Arc<IntelligentRouter>) -> Self {
        Self { router }
    }

    /// Identifier attached to the log lines of one request
    pub fn request_id() -> String {
        Uuid::new_v4().simple().to_string()
    }
}
