use std::sync::Arc;

use crate::ai::CompletionClient;
use crate::config::AppConfig;
use crate::models::{Account, Announcement, Leave, Task};
use crate::storage::ObjectStore;
use crate::store::{DocumentStore, Repository};

/// Shared handles every handler receives through axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn DocumentStore>,
    pub ai: Arc<dyn CompletionClient>,
    pub objects: Arc<dyn ObjectStore>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        store: Arc<dyn DocumentStore>,
        ai: Arc<dyn CompletionClient>,
        objects: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            store,
            ai,
            objects,
        }
    }

    pub fn accounts(&self) -> Repository<Account> {
        Repository::new(self.store.clone())
    }

    pub fn tasks(&self) -> Repository<Task> {
        Repository::new(self.store.clone())
    }

    pub fn leaves(&self) -> Repository<Leave> {
        Repository::new(self.store.clone())
    }

    pub fn announcements(&self) -> Repository<Announcement> {
        Repository::new(self.store.clone())
    }
}
