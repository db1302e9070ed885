// src/state.rs
use std::sync::Arc;

use crate::services::dispatcher::Dispatcher;
use crate::services::metrics_manager::MetricsManager;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub dispatcher: Dispatcher,
    pub metrics: MetricsManager,
}

impl AppState {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            metrics: MetricsManager::new(),
        }
    }
}
