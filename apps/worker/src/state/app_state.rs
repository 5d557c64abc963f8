use std::sync::Arc;

use crate::bootstrap::Persistence;
use crate::config::WorkerMode;

/// Shared state handed to request handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub mode: WorkerMode,
    persistence: Arc<Persistence>,
}

impl AppState {
    pub fn new(mode: WorkerMode, persistence: Persistence) -> Self {
        Self {
            mode,
            persistence: Arc::new(persistence),
        }
    }

    pub fn persistence(&self) -> &Persistence {
        &self.persistence
    }
}
