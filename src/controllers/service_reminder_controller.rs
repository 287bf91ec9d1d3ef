use std::sync::Arc;
use tokio::sync::watch;

use crate::dto::SyncResult;
use crate::services::reminder_sync_service::ServiceReminderSyncService;
use crate::utils::errors::{AppError, AppResult};

pub struct ServiceReminderController {
    service: Arc<ServiceReminderSyncService>,
}

impl ServiceReminderController {
    pub fn new(service: Arc<ServiceReminderSyncService>) -> Self {
        Self { service }
    }

    /// Lanzar una sincronización bajo demanda.
    ///
    /// Se ejecuta en su propia tarea: si el cliente HTTP se desconecta la
    /// sincronización termina igualmente y libera el lease.
    pub async fn trigger_sync(&self) -> AppResult<SyncResult> {
        let service = self.service.clone();

        let handle = tokio::spawn(async move {
            let (_cancel_tx, cancel_rx) = watch::channel(false);
            service.sync(&cancel_rx).await
        });

        handle
            .await
            .map_err(|e| AppError::Internal(format!("sync task failed: {}", e)))
    }
}
