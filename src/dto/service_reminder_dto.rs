use serde::{Deserialize, Serialize};

// Resultado de una ejecución de la sincronización de recordatorios
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncResult {
    pub generated_count: u64,
    pub success: bool,
    pub error_message: Option<String>,
    pub orphans_deleted: u64,
    pub statuses_refreshed: u64,
    pub schedules_processed: u64,
    pub assignments_skipped: u64,
    pub duration_ms: u64,
}

impl SyncResult {
    pub fn failed(message: String, duration_ms: u64) -> Self {
        Self {
            success: false,
            error_message: Some(message),
            duration_ms,
            ..Self::default()
        }
    }
}
