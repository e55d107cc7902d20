//! Shared application state.

use std::sync::Arc;

use backlot_catalog::Catalog;
use backlot_orchestrator::application::batch::BatchCoordinator;
use backlot_orchestrator::application::job_runner::JobRunner;
use backlot_orchestrator::application::store::SlotStore;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Briefs the server is willing to generate.
    pub catalog: Arc<Catalog>,
    /// Slot store backing status reads.
    pub store: SlotStore,
    /// Runner for single-asset generation.
    pub runner: Arc<JobRunner>,
    /// Coordinator for generate-all runs.
    pub coordinator: Arc<BatchCoordinator>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        catalog: Arc<Catalog>,
        store: SlotStore,
        runner: Arc<JobRunner>,
        coordinator: Arc<BatchCoordinator>,
    ) -> Self {
        Self {
            catalog,
            store,
            runner,
            coordinator,
        }
    }
}
