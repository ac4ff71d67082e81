use std::sync::Arc;

use reqwest::Client;

use shared_config::AppConfig;

use crate::supabase::SupabaseClient;

/// Process-wide state shared by every handler.
///
/// Holds the single HTTP client whose pool backs both the database client and
/// outbound calls. Built once at startup and dropped after shutdown.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub supabase: SupabaseClient,
    pub http: Client,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let http = Client::new();
        let supabase = SupabaseClient::with_client(http.clone(), &config);

        Self {
            config: Arc::new(config),
            supabase,
            http,
        }
    }
}
