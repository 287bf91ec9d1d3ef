//! Ensamblado de recordatorios
//!
//! Convierte una ocurrencia calculada en un `ReminderSnapshot` listo para
//! persistir. Sin efectos secundarios: los totales de tareas se calculan una
//! vez por schedule y se reutilizan para cada vehículo.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::models::service_reminder::{DuePoint, ReminderSnapshot};
use crate::models::service_schedule::ServiceScheduleRow;
use crate::models::service_task::ServiceTask;
use crate::models::vehicle::Vehicle;
use crate::services::occurrence_sequencer::CalculatedOccurrence;

/// Agregados de las tareas de un schedule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskTotals {
    pub task_count: i32,
    pub total_estimated_cost: Decimal,
    pub total_estimated_labour_hours: Decimal,
}

impl TaskTotals {
    pub fn from_tasks(tasks: &[ServiceTask]) -> Self {
        Self {
            task_count: i32::try_from(tasks.len()).unwrap_or(i32::MAX),
            total_estimated_cost: tasks
                .iter()
                .filter_map(|task| task.estimated_cost)
                .sum(),
            total_estimated_labour_hours: tasks
                .iter()
                .filter_map(|task| task.estimated_labour_hours)
                .sum(),
        }
    }
}

/// Ensamblador de snapshots para un schedule concreto
pub struct ReminderAssembler<'a> {
    schedule: &'a ServiceScheduleRow,
    totals: TaskTotals,
}

impl<'a> ReminderAssembler<'a> {
    pub fn new(schedule: &'a ServiceScheduleRow, tasks: &[ServiceTask]) -> Self {
        Self {
            schedule,
            totals: TaskTotals::from_tasks(tasks),
        }
    }

    pub fn totals(&self) -> &TaskTotals {
        &self.totals
    }

    /// Construir el snapshot de una ocurrencia para un vehículo
    pub fn assemble(
        &self,
        vehicle: &Vehicle,
        occurrence: &CalculatedOccurrence,
        now: DateTime<Utc>,
    ) -> ReminderSnapshot {
        let (current_mileage, mileage_variance, days_until_due) = match occurrence.due_point {
            DuePoint::Date(due_date) => (None, None, Some((due_date - now).num_days())),
            DuePoint::Mileage(due_mileage) => (
                Some(vehicle.current_mileage),
                Some(vehicle.current_mileage.saturating_sub(due_mileage)),
                None,
            ),
        };

        ReminderSnapshot {
            vehicle_id: vehicle.id,
            service_schedule_id: self.schedule.id,
            service_program_id: self.schedule.service_program_id,
            schedule_name: self.schedule.name.clone(),
            due_point: occurrence.due_point,
            status: occurrence.status,
            task_count: self.totals.task_count,
            total_estimated_cost: self.totals.total_estimated_cost,
            total_estimated_labour_hours: self.totals.total_estimated_labour_hours,
            current_mileage,
            mileage_variance,
            days_until_due,
        }
    }
}
