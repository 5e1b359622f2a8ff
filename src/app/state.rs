//! Application state management.

use std::sync::Arc;

use crate::domain::ScreeningStore;

use super::risk_engine::RiskEngine;
use super::service::{ScreeningService, ServiceConfig};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ScreeningService>,
}

impl AppState {
    /// Create a new application state with default service tuning
    #[must_use]
    pub fn new(store: Arc<dyn ScreeningStore>) -> Self {
        Self::with_config(store, ServiceConfig::default())
    }

    /// Create a new application state with custom service tuning
    #[must_use]
    pub fn with_config(store: Arc<dyn ScreeningStore>, config: ServiceConfig) -> Self {
        let service = Arc::new(ScreeningService::with_config(
            store,
            RiskEngine::new(),
            config,
        ));
        Self { service }
    }
}
