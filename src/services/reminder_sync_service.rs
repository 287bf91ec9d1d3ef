//! Orquestador de la sincronización de recordatorios
//!
//! Pasos, en orden estricto:
//! 1. Borrar recordatorios huérfanos
//! 2. Refrescar el estado de los recordatorios persistidos
//! 3. Cargar schedules activos con tareas y asignaciones (un solo lote)
//! 4. Calcular las ocurrencias de cada par (schedule, vehículo)
//! 5. Insertar solo las que no existen
//!
//! Cualquier error se registra y se convierte en un `SyncResult` fallido:
//! es un job en segundo plano, nunca debe tumbar a quien lo invoca.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::dto::SyncResult;
use crate::metrics::Metrics;
use crate::models::service_reminder::{ReminderSnapshot, ScheduleWithData};
use crate::repositories::ServiceReminderRepository;
use crate::services::occurrence_sequencer::OccurrenceSequence;
use crate::services::reminder_assembler::ReminderAssembler;
use crate::services::schedule_guard;
use crate::services::sync_lease::SyncLease;
use crate::utils::clock::Clock;
use crate::utils::errors::{AppError, AppResult};

/// Resultado del paso de cálculo (puro, sin I/O)
#[derive(Debug, Default)]
pub struct ReminderCalculation {
    pub snapshots: Vec<ReminderSnapshot>,
    pub schedules_processed: u64,
    pub assignments_skipped: u64,
}

/// Calcular todos los snapshots de un lote de schedules.
///
/// Todos los schedules se validan antes de calcular nada: un schedule con
/// tiempo y kilometraje a la vez (o ninguno) aborta la ejecución completa.
pub fn calculate_reminders(
    schedules: &[ScheduleWithData],
    now: DateTime<Utc>,
) -> AppResult<ReminderCalculation> {
    let rules = schedules
        .iter()
        .map(|data| schedule_guard::validate(&data.schedule))
        .collect::<AppResult<Vec<_>>>()?;

    let mut calculation = ReminderCalculation::default();
    let mut seen = HashSet::new();

    for (data, rule) in schedules.iter().zip(rules.iter()) {
        if data.tasks.is_empty() {
            debug!("⏭️ Schedule {} sin tareas, se omite", data.schedule.id);
            continue;
        }

        let assembler = ReminderAssembler::new(&data.schedule, &data.tasks);
        calculation.schedules_processed += 1;
        debug!(
            "📋 Schedule {} ({} tareas, {} asignaciones)",
            data.schedule.name,
            assembler.totals().task_count,
            data.assignments.len()
        );

        for assigned in &data.assignments {
            let Some(vehicle) = assigned.vehicle.as_ref() else {
                warn!(
                    "⚠️ Asignación del vehículo {} al programa {} sin vehículo, se omite",
                    assigned.assignment.vehicle_id, assigned.assignment.service_program_id
                );
                calculation.assignments_skipped += 1;
                continue;
            };

            for occurrence in OccurrenceSequence::new(rule, &assigned.assignment, vehicle, now) {
                let snapshot = assembler.assemble(vehicle, &occurrence, now);
                if seen.insert(snapshot.key()) {
                    calculation.snapshots.push(snapshot);
                }
            }
        }
    }

    Ok(calculation)
}

fn ensure_not_cancelled(cancel: &watch::Receiver<bool>) -> AppResult<()> {
    if *cancel.borrow() {
        return Err(AppError::Cancelled);
    }
    Ok(())
}

/// Servicio de sincronización de recordatorios de mantenimiento
pub struct ServiceReminderSyncService {
    repository: Arc<dyn ServiceReminderRepository>,
    clock: Arc<dyn Clock>,
    lease: Arc<dyn SyncLease>,
    metrics: Option<Arc<Metrics>>,
}

impl ServiceReminderSyncService {
    pub fn new(
        repository: Arc<dyn ServiceReminderRepository>,
        clock: Arc<dyn Clock>,
        lease: Arc<dyn SyncLease>,
    ) -> Self {
        Self {
            repository,
            clock,
            lease,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Ejecutar una sincronización completa
    pub async fn sync(&self, cancel: &watch::Receiver<bool>) -> SyncResult {
        let started = Instant::now();
        let result = self.sync_with_lease(cancel, started).await;

        if let Some(metrics) = &self.metrics {
            metrics.record_sync(&result);
        }
        result
    }

    async fn sync_with_lease(&self, cancel: &watch::Receiver<bool>, started: Instant) -> SyncResult {
        let token = match self.lease.try_acquire().await {
            Ok(Some(token)) => token,
            Ok(None) => {
                warn!("🔒 Ya hay una sincronización de recordatorios en curso");
                return SyncResult::failed(AppError::SyncInProgress.to_string(), elapsed_ms(started));
            }
            Err(e) => {
                error!("❌ No se pudo obtener el lease de sincronización: {}", e);
                return SyncResult::failed(e.to_string(), elapsed_ms(started));
            }
        };

        let result = match self.run(cancel).await {
            Ok(mut result) => {
                result.duration_ms = elapsed_ms(started);
                info!(
                    "✅ Sincronización completada: {} recordatorios nuevos, {} huérfanos borrados, {} estados refrescados ({} ms)",
                    result.generated_count,
                    result.orphans_deleted,
                    result.statuses_refreshed,
                    result.duration_ms
                );
                result
            }
            Err(e) => {
                error!("❌ Error en la sincronización de recordatorios: {}", e);
                SyncResult::failed(e.to_string(), elapsed_ms(started))
            }
        };

        if let Err(e) = self.lease.release(token).await {
            warn!("⚠️ Error liberando el lease de sincronización: {}", e);
        }

        result
    }

    async fn run(&self, cancel: &watch::Receiver<bool>) -> AppResult<SyncResult> {
        let now = self.clock.now();
        info!("🔄 Iniciando sincronización de recordatorios ({})", now.to_rfc3339());

        ensure_not_cancelled(cancel)?;
        let orphans_deleted = self.repository.delete_orphaned_reminders().await?;
        debug!("🧹 {} recordatorios huérfanos borrados", orphans_deleted);

        ensure_not_cancelled(cancel)?;
        let statuses_refreshed = self.repository.refresh_all_reminder_statuses(now).await?;
        debug!("♻️ {} estados de recordatorio refrescados", statuses_refreshed);

        ensure_not_cancelled(cancel)?;
        let schedules = self
            .repository
            .get_active_schedules_with_tasks_and_assignments()
            .await?;

        let calculation = calculate_reminders(&schedules, now)?;
        debug!(
            "🧮 {} recordatorios calculados para {} schedules",
            calculation.snapshots.len(),
            calculation.schedules_processed
        );

        ensure_not_cancelled(cancel)?;
        let generated_count = if calculation.snapshots.is_empty() {
            0
        } else {
            self.repository
                .insert_new_reminders(&calculation.snapshots)
                .await?
        };

        Ok(SyncResult {
            generated_count,
            success: true,
            error_message: None,
            orphans_deleted,
            statuses_refreshed,
            schedules_processed: calculation.schedules_processed,
            assignments_skipped: calculation.assignments_skipped,
            duration_ms: 0,
        })
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::service_reminder::{DuePoint, ServiceReminderStatus};
    use crate::models::service_schedule::{ServiceScheduleRow, TimeIntervalUnit};
    use crate::models::service_task::ServiceTask;
    use crate::models::vehicle::{AssignedVehicle, Vehicle, VehicleAssignment};
    use chrono::TimeZone;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn mileage_schedule() -> ServiceScheduleRow {
        ServiceScheduleRow {
            id: Uuid::new_v4(),
            service_program_id: Uuid::new_v4(),
            name: "Brake inspection".to_string(),
            time_interval_value: None,
            time_interval_unit: None,
            time_buffer_value: None,
            time_buffer_unit: None,
            mileage_interval: Some(5000),
            mileage_buffer: Some(500),
            first_service_date: None,
            first_service_mileage: Some(10_000),
            is_active: true,
            is_soft_deleted: false,
        }
    }

    fn task() -> ServiceTask {
        ServiceTask {
            id: Uuid::new_v4(),
            name: "Inspect pads".to_string(),
            estimated_labour_hours: Some(Decimal::new(15, 1)),
            estimated_cost: Some(Decimal::new(8_000, 2)),
        }
    }

    fn assigned(program_id: Uuid, vehicle: Option<Vehicle>) -> AssignedVehicle {
        AssignedVehicle {
            assignment: VehicleAssignment {
                vehicle_id: vehicle.as_ref().map(|v| v.id).unwrap_or_else(Uuid::new_v4),
                service_program_id: program_id,
                added_at: date(2024, 1, 1),
                vehicle_mileage_at_assignment: None,
            },
            vehicle,
        }
    }

    fn vehicle(current_mileage: i32) -> Vehicle {
        Vehicle {
            id: Uuid::new_v4(),
            name: "Truck".to_string(),
            current_mileage,
        }
    }

    #[test]
    fn test_calculates_every_vehicle_and_skips_missing_ones() {
        let schedule = mileage_schedule();
        let program_id = schedule.service_program_id;
        let data = ScheduleWithData {
            schedule,
            tasks: vec![task(), task()],
            assignments: vec![
                assigned(program_id, Some(vehicle(22_300))),
                assigned(program_id, None),
                assigned(program_id, Some(vehicle(5_000))),
            ],
        };

        let calculation = calculate_reminders(&[data], date(2024, 3, 15)).unwrap();

        assert_eq!(calculation.schedules_processed, 1);
        assert_eq!(calculation.assignments_skipped, 1);
        // 4 ocurrencias para el primer vehículo, 1 (UPCOMING) para el segundo
        assert_eq!(calculation.snapshots.len(), 5);
        assert!(calculation.snapshots.iter().all(|s| s.task_count == 2));
        assert_eq!(
            calculation.snapshots[4].due_point,
            DuePoint::Mileage(10_000)
        );
        assert_eq!(
            calculation.snapshots[4].status,
            ServiceReminderStatus::Upcoming
        );
    }

    #[test]
    fn test_schedule_without_tasks_is_skipped() {
        let schedule = mileage_schedule();
        let program_id = schedule.service_program_id;
        let data = ScheduleWithData {
            schedule,
            tasks: vec![],
            assignments: vec![assigned(program_id, Some(vehicle(22_300)))],
        };

        let calculation = calculate_reminders(&[data], date(2024, 3, 15)).unwrap();
        assert!(calculation.snapshots.is_empty());
        assert_eq!(calculation.schedules_processed, 0);
    }

    #[test]
    fn test_invalid_schedule_aborts_whole_calculation() {
        let valid = mileage_schedule();
        let program_id = valid.service_program_id;
        let mut invalid = mileage_schedule();
        invalid.time_interval_value = Some(30);
        invalid.time_interval_unit = Some(TimeIntervalUnit::Days);
        let invalid_id = invalid.id;

        let batch = vec![
            ScheduleWithData {
                schedule: valid,
                tasks: vec![task()],
                assignments: vec![assigned(program_id, Some(vehicle(22_300)))],
            },
            ScheduleWithData {
                schedule: invalid,
                tasks: vec![task()],
                assignments: vec![],
            },
        ];

        match calculate_reminders(&batch, date(2024, 3, 15)) {
            Err(AppError::InvalidSchedule { schedule_id, .. }) => assert_eq!(schedule_id, invalid_id),
            other => panic!("expected InvalidSchedule, got {:?}", other.map(|c| c.snapshots.len())),
        }
    }

    #[test]
    fn test_duplicate_assignments_do_not_duplicate_snapshots() {
        let schedule = mileage_schedule();
        let program_id = schedule.service_program_id;
        let truck = vehicle(22_300);
        let data = ScheduleWithData {
            schedule,
            tasks: vec![task()],
            assignments: vec![
                assigned(program_id, Some(truck.clone())),
                assigned(program_id, Some(truck)),
            ],
        };

        let calculation = calculate_reminders(&[data], date(2024, 3, 15)).unwrap();
        assert_eq!(calculation.snapshots.len(), 4);
    }
}
