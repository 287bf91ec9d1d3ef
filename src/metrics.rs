//! Métricas Prometheus de la sincronización de recordatorios
//!
//! Cada ejecución (job programado o trigger HTTP) se registra aquí y se
//! expone en `GET /metrics`.

use prometheus::{Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder};

use crate::dto::SyncResult;
use crate::utils::errors::{AppError, AppResult};

fn sync_duration_buckets() -> Vec<f64> {
    vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 300.0]
}

pub struct Metrics {
    registry: Registry,

    // Contadores
    pub sync_runs_total: IntCounter,
    pub sync_failures_total: IntCounter,
    pub reminders_generated_total: IntCounter,
    pub orphaned_reminders_deleted_total: IntCounter,
    pub assignments_skipped_total: IntCounter,

    // Gauges
    pub last_sync_generated: IntGauge,
    pub last_sync_success: IntGauge,

    // Histogramas
    pub sync_duration_seconds: Histogram,
}

impl Metrics {
    /// Crear y registrar todas las métricas
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let sync_runs_total = IntCounter::new(
            "reminder_sync_runs_total",
            "Total number of reminder sync runs",
        )?;
        let sync_failures_total = IntCounter::new(
            "reminder_sync_failures_total",
            "Total number of reminder sync runs that did not succeed",
        )?;
        let reminders_generated_total = IntCounter::new(
            "reminders_generated_total",
            "Total number of service reminders inserted",
        )?;
        let orphaned_reminders_deleted_total = IntCounter::new(
            "orphaned_reminders_deleted_total",
            "Total number of orphaned service reminders deleted",
        )?;
        let assignments_skipped_total = IntCounter::new(
            "reminder_assignments_skipped_total",
            "Total number of vehicle assignments skipped for missing vehicles",
        )?;
        let last_sync_generated = IntGauge::new(
            "reminder_last_sync_generated",
            "Reminders inserted by the last sync run",
        )?;
        let last_sync_success = IntGauge::new(
            "reminder_last_sync_success",
            "1 if the last sync run succeeded, 0 otherwise",
        )?;
        let sync_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "reminder_sync_duration_seconds",
                "Reminder sync run duration in seconds",
            )
            .buckets(sync_duration_buckets()),
        )?;

        registry.register(Box::new(sync_runs_total.clone()))?;
        registry.register(Box::new(sync_failures_total.clone()))?;
        registry.register(Box::new(reminders_generated_total.clone()))?;
        registry.register(Box::new(orphaned_reminders_deleted_total.clone()))?;
        registry.register(Box::new(assignments_skipped_total.clone()))?;
        registry.register(Box::new(last_sync_generated.clone()))?;
        registry.register(Box::new(last_sync_success.clone()))?;
        registry.register(Box::new(sync_duration_seconds.clone()))?;

        Ok(Self {
            registry,
            sync_runs_total,
            sync_failures_total,
            reminders_generated_total,
            orphaned_reminders_deleted_total,
            assignments_skipped_total,
            last_sync_generated,
            last_sync_success,
            sync_duration_seconds,
        })
    }

    /// Registrar el resultado de una ejecución
    pub fn record_sync(&self, result: &SyncResult) {
        self.sync_runs_total.inc();
        self.sync_duration_seconds
            .observe(result.duration_ms as f64 / 1000.0);

        if result.success {
            self.reminders_generated_total.inc_by(result.generated_count);
            self.orphaned_reminders_deleted_total
                .inc_by(result.orphans_deleted);
            self.assignments_skipped_total
                .inc_by(result.assignments_skipped);
            self.last_sync_generated
                .set(i64::try_from(result.generated_count).unwrap_or(i64::MAX));
            self.last_sync_success.set(1);
        } else {
            self.sync_failures_total.inc();
            self.last_sync_success.set(0);
        }
    }

    /// Exportar en formato texto de Prometheus
    pub fn render(&self) -> AppResult<String> {
        TextEncoder::new()
            .encode_to_string(&self.registry.gather())
            .map_err(|e| AppError::Internal(format!("metrics encoding failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_successful_and_failed_runs() {
        let metrics = Metrics::new().unwrap();

        metrics.record_sync(&SyncResult {
            generated_count: 4,
            success: true,
            orphans_deleted: 2,
            duration_ms: 120,
            ..SyncResult::default()
        });
        metrics.record_sync(&SyncResult::failed("boom".to_string(), 5));

        assert_eq!(metrics.sync_runs_total.get(), 2);
        assert_eq!(metrics.sync_failures_total.get(), 1);
        assert_eq!(metrics.reminders_generated_total.get(), 4);
        assert_eq!(metrics.orphaned_reminders_deleted_total.get(), 2);
        assert_eq!(metrics.last_sync_generated.get(), 4);
        assert_eq!(metrics.last_sync_success.get(), 0);

        let text = metrics.render().unwrap();
        assert!(text.contains("reminder_sync_runs_total 2"));
        assert!(text.contains("reminders_generated_total 4"));
    }
}
