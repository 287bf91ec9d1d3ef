//! Repositorio en memoria
//!
//! Implementación del contrato `ServiceReminderRepository` sin base de datos:
//! la usan los tests y las ejecuciones en seco. Registra cada llamada para
//! poder comprobar el orden de los pasos de la sincronización.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::service_reminder_repository::ServiceReminderRepository;
use crate::models::service_reminder::{
    ReminderKey, ReminderSnapshot, ScheduleWithData, ServiceReminder, ServiceReminderStatus,
};
use crate::models::service_schedule::ServiceScheduleRow;
use crate::models::service_task::ServiceTask;
use crate::models::vehicle::{AssignedVehicle, Vehicle, VehicleAssignment};
use crate::services::schedule_guard;
use crate::services::status_classifier::classify_due_point;
use crate::utils::errors::{AppError, AppResult};

/// Llamada registrada al repositorio
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryCall {
    DeleteOrphanedReminders,
    RefreshAllReminderStatuses,
    GetActiveSchedules,
    InsertNewReminders,
}

#[derive(Default)]
struct State {
    calls: Vec<RepositoryCall>,
    schedules: Vec<ServiceScheduleRow>,
    tasks: HashMap<Uuid, Vec<ServiceTask>>,
    vehicles: HashMap<Uuid, Vehicle>,
    assignments: Vec<VehicleAssignment>,
    reminders: Vec<ServiceReminder>,
    fail_on: Option<RepositoryCall>,
}

#[derive(Default)]
pub struct InMemoryReminderRepository {
    state: Mutex<State>,
}

impl InMemoryReminderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, call: RepositoryCall) -> AppResult<MutexGuard<'_, State>> {
        let mut state = self.lock();
        state.calls.push(call);
        if state.fail_on == Some(call) {
            return Err(AppError::Internal(format!("injected failure on {:?}", call)));
        }
        Ok(state)
    }

    pub fn add_schedule(&self, schedule: ServiceScheduleRow, tasks: Vec<ServiceTask>) {
        let mut state = self.lock();
        state.tasks.insert(schedule.id, tasks);
        state.schedules.retain(|s| s.id != schedule.id);
        state.schedules.push(schedule);
    }

    pub fn remove_schedule(&self, schedule_id: Uuid) {
        let mut state = self.lock();
        state.schedules.retain(|s| s.id != schedule_id);
        state.tasks.remove(&schedule_id);
    }

    pub fn soft_delete_schedule(&self, schedule_id: Uuid) {
        let mut state = self.lock();
        if let Some(schedule) = state.schedules.iter_mut().find(|s| s.id == schedule_id) {
            schedule.is_soft_deleted = true;
        }
    }

    pub fn add_vehicle(&self, vehicle: Vehicle) {
        self.lock().vehicles.insert(vehicle.id, vehicle);
    }

    pub fn remove_vehicle(&self, vehicle_id: Uuid) {
        self.lock().vehicles.remove(&vehicle_id);
    }

    pub fn set_vehicle_mileage(&self, vehicle_id: Uuid, current_mileage: i32) {
        if let Some(vehicle) = self.lock().vehicles.get_mut(&vehicle_id) {
            vehicle.current_mileage = current_mileage;
        }
    }

    pub fn assign_vehicle(&self, assignment: VehicleAssignment) {
        self.lock().assignments.push(assignment);
    }

    pub fn unassign_vehicle(&self, vehicle_id: Uuid, service_program_id: Uuid) {
        self.lock().assignments.retain(|a| {
            !(a.vehicle_id == vehicle_id && a.service_program_id == service_program_id)
        });
    }

    /// Marcar un recordatorio como completado (lo hace un colaborador externo)
    pub fn complete_reminder(&self, reminder_id: Uuid) {
        if let Some(reminder) = self.lock().reminders.iter_mut().find(|r| r.id == reminder_id) {
            reminder.status = ServiceReminderStatus::Completed;
        }
    }

    /// Hacer fallar todas las llamadas de un tipo (`None` lo desactiva)
    pub fn fail_on(&self, call: Option<RepositoryCall>) {
        self.lock().fail_on = call;
    }

    pub fn reminders(&self) -> Vec<ServiceReminder> {
        self.lock().reminders.clone()
    }

    pub fn calls(&self) -> Vec<RepositoryCall> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }
}

impl State {
    fn is_linked(&self, reminder: &ServiceReminder) -> bool {
        let Some(schedule) = self
            .schedules
            .iter()
            .find(|s| s.id == reminder.service_schedule_id && !s.is_soft_deleted)
        else {
            return false;
        };

        self.vehicles.contains_key(&reminder.vehicle_id)
            && self.assignments.iter().any(|a| {
                a.vehicle_id == reminder.vehicle_id
                    && a.service_program_id == schedule.service_program_id
            })
    }
}

#[async_trait]
impl ServiceReminderRepository for InMemoryReminderRepository {
    async fn delete_orphaned_reminders(&self) -> AppResult<u64> {
        let mut state = self.record(RepositoryCall::DeleteOrphanedReminders)?;

        let reminders = std::mem::take(&mut state.reminders);
        let before = reminders.len();
        let kept: Vec<ServiceReminder> = reminders
            .into_iter()
            .filter(|r| r.status == ServiceReminderStatus::Completed || state.is_linked(r))
            .collect();
        let deleted = before - kept.len();
        state.reminders = kept;

        Ok(deleted as u64)
    }

    async fn refresh_all_reminder_statuses(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let mut state = self.record(RepositoryCall::RefreshAllReminderStatuses)?;

        let rules: HashMap<Uuid, _> = state
            .schedules
            .iter()
            .filter_map(|s| schedule_guard::validate(s).ok().map(|rule| (s.id, rule)))
            .collect();
        let mileages: HashMap<Uuid, i32> = state
            .vehicles
            .values()
            .map(|v| (v.id, v.current_mileage))
            .collect();

        let mut refreshed = 0;
        for reminder in state.reminders.iter_mut() {
            if reminder.status == ServiceReminderStatus::Completed {
                continue;
            }
            let (Some(rule), Some(&current_mileage), Some(due_point)) = (
                rules.get(&reminder.service_schedule_id),
                mileages.get(&reminder.vehicle_id),
                reminder.due_point(),
            ) else {
                continue;
            };

            reminder.status = classify_due_point(&due_point, rule, now, current_mileage);
            reminder.days_until_due = due_point.date().map(|due| (due - now).num_days());
            reminder.current_mileage = due_point.mileage().map(|_| current_mileage);
            reminder.mileage_variance = due_point
                .mileage()
                .map(|due| current_mileage.saturating_sub(due));
            reminder.updated_at = now;
            refreshed += 1;
        }

        // Un solo UPCOMING por par: el de vencimiento más próximo
        let mut earliest_upcoming: HashMap<(Uuid, Uuid), (Option<DateTime<Utc>>, Option<i32>)> =
            HashMap::new();
        for reminder in state.reminders.iter().filter(|r| r.status == ServiceReminderStatus::Upcoming) {
            let due = (reminder.due_date, reminder.due_mileage);
            earliest_upcoming
                .entry(reminder.pair())
                .and_modify(|current| {
                    if due < *current {
                        *current = due;
                    }
                })
                .or_insert(due);
        }
        state.reminders.retain(|r| {
            r.status != ServiceReminderStatus::Upcoming
                || earliest_upcoming.get(&r.pair()) == Some(&(r.due_date, r.due_mileage))
        });

        Ok(refreshed)
    }

    async fn get_active_schedules_with_tasks_and_assignments(&self) -> AppResult<Vec<ScheduleWithData>> {
        let state = self.record(RepositoryCall::GetActiveSchedules)?;

        Ok(state
            .schedules
            .iter()
            .filter(|s| s.is_active && !s.is_soft_deleted)
            .map(|schedule| ScheduleWithData {
                schedule: schedule.clone(),
                tasks: state.tasks.get(&schedule.id).cloned().unwrap_or_default(),
                assignments: state
                    .assignments
                    .iter()
                    .filter(|a| a.service_program_id == schedule.service_program_id)
                    .map(|a| AssignedVehicle {
                        assignment: a.clone(),
                        vehicle: state.vehicles.get(&a.vehicle_id).cloned(),
                    })
                    .collect(),
            })
            .collect())
    }

    async fn insert_new_reminders(&self, snapshots: &[ReminderSnapshot]) -> AppResult<u64> {
        let mut state = self.record(RepositoryCall::InsertNewReminders)?;

        // Un UPCOMING persistido que ya no está en el cálculo quedó obsoleto
        // (el ancla se movió): se sustituye por el nuevo
        let calculated: HashSet<ReminderKey> = snapshots.iter().map(|s| s.key()).collect();
        let calculated_pairs: HashSet<(Uuid, Uuid)> = calculated.iter().map(|k| k.pair()).collect();
        state.reminders.retain(|r| {
            r.status != ServiceReminderStatus::Upcoming
                || !calculated_pairs.contains(&r.pair())
                || r.key().is_some_and(|key| calculated.contains(&key))
        });

        let mut existing: HashSet<_> = state.reminders.iter().filter_map(|r| r.key()).collect();
        let mut upcoming_pairs: HashSet<(Uuid, Uuid)> = state
            .reminders
            .iter()
            .filter(|r| r.status == ServiceReminderStatus::Upcoming)
            .map(|r| r.pair())
            .collect();
        let now = Utc::now();
        let mut inserted = 0;
        for snapshot in snapshots {
            let key = snapshot.key();
            if existing.contains(&key) {
                continue;
            }
            if snapshot.status == ServiceReminderStatus::Upcoming && !upcoming_pairs.insert(key.pair()) {
                continue;
            }
            existing.insert(key);
            state.reminders.push(ServiceReminder::from_snapshot(snapshot, now));
            inserted += 1;
        }

        Ok(inserted)
    }
}
