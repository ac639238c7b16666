use std::sync::Arc;

use slidepress_core::{Config, JobRegistry, Scheduler};

/// Shared application state
pub struct AppState {
    config: Config,
    registry: Arc<JobRegistry>,
    scheduler: Arc<Scheduler>,
}

impl AppState {
    pub fn new(config: Config, registry: Arc<JobRegistry>, scheduler: Arc<Scheduler>) -> Self {
        Self {
            config,
            registry,
            scheduler,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }
}
