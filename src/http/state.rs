use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::http::proxy::ProxyClient;
use crate::interview::LiveInterview;
use crate::scoring::{HttpScoringClient, ScoringBackend};
use crate::store::LocalStore;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,

    /// Durable session/stats store
    pub store: Arc<LocalStore>,

    /// Scoring backend shared by all live sessions
    pub scoring: Arc<dyn ScoringBackend>,

    /// Live interview sessions (session_id → session)
    pub live: Arc<RwLock<HashMap<String, Arc<LiveInterview>>>>,

    /// Pass-through client for the external backend
    pub proxy: Arc<ProxyClient>,
}

impl AppState {
    pub fn new(config: Config, store: LocalStore) -> Self {
        let scoring = Arc::new(HttpScoringClient::new(config.scoring.endpoint_url.clone()));
        Self::with_scoring(config, store, scoring)
    }

    /// Build state around a caller-supplied scoring backend (tests)
    pub fn with_scoring(
        config: Config,
        store: LocalStore,
        scoring: Arc<dyn ScoringBackend>,
    ) -> Self {
        let proxy = Arc::new(ProxyClient::new(config.backend.base_url.clone()));
        Self {
            config: Arc::new(config),
            store: Arc::new(store),
            scoring,
            live: Arc::new(RwLock::new(HashMap::new())),
            proxy,
        }
    }
}
