// libs/scheduling-cell/src/state.rs
use std::sync::Arc;

use registry_cell::RegistryClient;
use shared_config::AppConfig;

use crate::store::AppointmentStore;

/// Shared state for the scheduling routes: configuration, the registry
/// client, and the appointment store, which must outlive any one request.
pub struct AppState {
    pub config: AppConfig,
    pub registry: Arc<RegistryClient>,
    pub store: Arc<AppointmentStore>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let registry = Arc::new(RegistryClient::new(&config));
        Self {
            config,
            registry,
            store: Arc::new(AppointmentStore::new()),
        }
    }
}
