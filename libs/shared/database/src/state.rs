use std::sync::Arc;

use shared_config::AppConfig;

use crate::supabase::SupabaseClient;

/// Process-wide application state: configuration plus the single store
/// handle, opened at startup and dropped at shutdown.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<SupabaseClient>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let store = Arc::new(SupabaseClient::new(&config));
        Self { config, store }
    }
}
