//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum.

use std::sync::Arc;

use crate::metrics::Metrics;
use crate::services::reminder_sync_service::ServiceReminderSyncService;

#[derive(Clone)]
pub struct AppState {
    pub sync_service: Arc<ServiceReminderSyncService>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(sync_service: Arc<ServiceReminderSyncService>, metrics: Arc<Metrics>) -> Self {
        Self {
            sync_service,
            metrics,
        }
    }
}
