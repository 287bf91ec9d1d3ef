//! Modelo de ServiceReminder
//!
//! Este módulo contiene la entidad que produce el motor de sincronización:
//! el snapshot calculado (`ReminderSnapshot`) y la fila persistida
//! (`ServiceReminder`), más los datos agregados que el repositorio entrega
//! al orquestador (`ScheduleWithData`).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;

use super::service_schedule::ServiceScheduleRow;
use super::service_task::ServiceTask;
use super::vehicle::AssignedVehicle;

/// Estado del recordatorio - mapea al ENUM service_reminder_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "service_reminder_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceReminderStatus {
    Upcoming,
    DueSoon,
    Overdue,
    Completed,
}

impl ServiceReminderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceReminderStatus::Upcoming => "UPCOMING",
            ServiceReminderStatus::DueSoon => "DUE_SOON",
            ServiceReminderStatus::Overdue => "OVERDUE",
            ServiceReminderStatus::Completed => "COMPLETED",
        }
    }
}

impl std::fmt::Display for ServiceReminderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Punto de vencimiento: fecha o kilometraje, nunca ambos
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DuePoint {
    Date(DateTime<Utc>),
    Mileage(i32),
}

impl DuePoint {
    pub fn date(&self) -> Option<DateTime<Utc>> {
        match self {
            DuePoint::Date(date) => Some(*date),
            DuePoint::Mileage(_) => None,
        }
    }

    pub fn mileage(&self) -> Option<i32> {
        match self {
            DuePoint::Date(_) => None,
            DuePoint::Mileage(mileage) => Some(*mileage),
        }
    }

    /// Reconstruir desde las columnas anulables de la tabla
    pub fn from_columns(due_date: Option<DateTime<Utc>>, due_mileage: Option<i32>) -> Option<Self> {
        match (due_date, due_mileage) {
            (Some(date), None) => Some(DuePoint::Date(date)),
            (None, Some(mileage)) => Some(DuePoint::Mileage(mileage)),
            _ => None,
        }
    }
}

impl std::fmt::Display for DuePoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DuePoint::Date(date) => write!(f, "{}", date.format("%Y-%m-%d %H:%M")),
            DuePoint::Mileage(mileage) => write!(f, "{} km", mileage),
        }
    }
}

/// Clave natural de un recordatorio: (vehículo, schedule, punto de vencimiento)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReminderKey {
    pub vehicle_id: Uuid,
    pub service_schedule_id: Uuid,
    pub due_point: DuePoint,
}

impl ReminderKey {
    /// Par (vehículo, schedule) al que pertenece el recordatorio
    pub fn pair(&self) -> (Uuid, Uuid) {
        (self.vehicle_id, self.service_schedule_id)
    }
}

/// Recordatorio calculado, todavía sin persistir
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReminderSnapshot {
    pub vehicle_id: Uuid,
    pub service_schedule_id: Uuid,
    pub service_program_id: Uuid,
    pub schedule_name: String,
    pub due_point: DuePoint,
    pub status: ServiceReminderStatus,
    pub task_count: i32,
    pub total_estimated_cost: Decimal,
    pub total_estimated_labour_hours: Decimal,
    pub current_mileage: Option<i32>,
    pub mileage_variance: Option<i32>,
    pub days_until_due: Option<i64>,
}

impl ReminderSnapshot {
    pub fn key(&self) -> ReminderKey {
        ReminderKey {
            vehicle_id: self.vehicle_id,
            service_schedule_id: self.service_schedule_id,
            due_point: self.due_point,
        }
    }
}

/// ServiceReminder persistido - mapea a la tabla service_reminders
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct ServiceReminder {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub service_schedule_id: Uuid,
    pub service_program_id: Uuid,
    pub schedule_name: String,
    pub due_date: Option<DateTime<Utc>>,
    pub due_mileage: Option<i32>,
    pub status: ServiceReminderStatus,
    pub task_count: i32,
    pub total_estimated_cost: Decimal,
    pub total_estimated_labour_hours: Decimal,
    pub current_mileage: Option<i32>,
    pub mileage_variance: Option<i32>,
    pub days_until_due: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ServiceReminder {
    /// Materializar un snapshot como fila persistida
    pub fn from_snapshot(snapshot: &ReminderSnapshot, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            vehicle_id: snapshot.vehicle_id,
            service_schedule_id: snapshot.service_schedule_id,
            service_program_id: snapshot.service_program_id,
            schedule_name: snapshot.schedule_name.clone(),
            due_date: snapshot.due_point.date(),
            due_mileage: snapshot.due_point.mileage(),
            status: snapshot.status,
            task_count: snapshot.task_count,
            total_estimated_cost: snapshot.total_estimated_cost,
            total_estimated_labour_hours: snapshot.total_estimated_labour_hours,
            current_mileage: snapshot.current_mileage,
            mileage_variance: snapshot.mileage_variance,
            days_until_due: snapshot.days_until_due,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn due_point(&self) -> Option<DuePoint> {
        DuePoint::from_columns(self.due_date, self.due_mileage)
    }

    pub fn pair(&self) -> (Uuid, Uuid) {
        (self.vehicle_id, self.service_schedule_id)
    }

    pub fn key(&self) -> Option<ReminderKey> {
        self.due_point().map(|due_point| ReminderKey {
            vehicle_id: self.vehicle_id,
            service_schedule_id: self.service_schedule_id,
            due_point,
        })
    }
}

/// Schedule activo con sus tareas y vehículos asignados, cargado en un solo lote
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleWithData {
    pub schedule: ServiceScheduleRow,
    pub tasks: Vec<ServiceTask>,
    pub assignments: Vec<AssignedVehicle>,
}
