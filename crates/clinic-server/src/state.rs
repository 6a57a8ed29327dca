use std::sync::Arc;

use clinic_storage::DynStore;

use crate::config::{AppConfig, PaginationConfig};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub store: DynStore,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(store: DynStore, config: AppConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    pub fn pagination(&self) -> &PaginationConfig {
        &self.config.pagination
    }
}
