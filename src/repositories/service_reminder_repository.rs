//! Repositorio de recordatorios de servicio
//!
//! Define el contrato que el orquestador de sincronización consume y su
//! implementación sobre PostgreSQL con SQLx.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::service_reminder::{ReminderSnapshot, ScheduleWithData};
use crate::models::service_schedule::ServiceScheduleRow;
use crate::models::service_task::ServiceTask;
use crate::models::vehicle::{AssignedVehicle, Vehicle, VehicleAssignment};
use crate::utils::errors::AppResult;

/// Filas por sentencia INSERT (16 parámetros por fila, límite de 65535)
const INSERT_CHUNK_SIZE: usize = 1000;

/// Clasificación de los recordatorios persistidos (no COMPLETED) a fecha `$1`
const CLASSIFIED_REMINDERS_CTE: &str = r#"
WITH classified AS (
    SELECT r.id,
           r.vehicle_id,
           r.service_schedule_id,
           r.due_date,
           r.due_mileage,
           v.current_mileage,
           CASE
               WHEN r.due_date IS NOT NULL THEN
                   CASE
                       WHEN $1::timestamptz >= r.due_date THEN 'OVERDUE'
                       WHEN $1::timestamptz >= r.due_date - make_interval(hours =>
                            COALESCE(s.time_buffer_value, 0) *
                            CASE COALESCE(s.time_buffer_unit, s.time_interval_unit)
                                WHEN 'WEEKS' THEN 168
                                WHEN 'DAYS' THEN 24
                                ELSE 1
                            END) THEN 'DUE_SOON'
                       ELSE 'UPCOMING'
                   END
               ELSE
                   CASE
                       WHEN v.current_mileage >= r.due_mileage THEN 'OVERDUE'
                       WHEN v.current_mileage >= r.due_mileage - COALESCE(s.mileage_buffer, 0) THEN 'DUE_SOON'
                       ELSE 'UPCOMING'
                   END
           END::service_reminder_status AS new_status
    FROM service_reminders r
    JOIN service_schedules s ON s.id = r.service_schedule_id
    JOIN vehicles v ON v.id = r.vehicle_id
    WHERE r.status <> 'COMPLETED'
)
"#;

/// Colaborador de persistencia del motor de recordatorios
#[async_trait]
pub trait ServiceReminderRepository: Send + Sync {
    /// Borrar recordatorios cuyo schedule o asignación de vehículo ya no existe
    async fn delete_orphaned_reminders(&self) -> AppResult<u64>;

    /// Recalcular el estado de los recordatorios ya persistidos, dejando como
    /// mucho un UPCOMING por par (vehículo, schedule)
    async fn refresh_all_reminder_statuses(&self, now: DateTime<Utc>) -> AppResult<u64>;

    /// Cargar en un solo lote los schedules activos con tareas y asignaciones
    async fn get_active_schedules_with_tasks_and_assignments(&self) -> AppResult<Vec<ScheduleWithData>>;

    /// Insertar solo los snapshots que no existen ya (idempotente por clave natural).
    ///
    /// Antes de insertar borra los UPCOMING persistidos de cada par calculado
    /// cuyo punto de vencimiento ya no forma parte del cálculo.
    async fn insert_new_reminders(&self, snapshots: &[ReminderSnapshot]) -> AppResult<u64>;
}

#[derive(Debug, FromRow)]
struct ScheduleTaskRow {
    service_schedule_id: Uuid,
    #[sqlx(flatten)]
    task: ServiceTask,
}

#[derive(Debug, FromRow)]
struct AssignmentRow {
    #[sqlx(flatten)]
    assignment: VehicleAssignment,
    found_vehicle_id: Option<Uuid>,
    vehicle_name: Option<String>,
    vehicle_current_mileage: Option<i32>,
}

impl AssignmentRow {
    fn into_assigned_vehicle(self) -> AssignedVehicle {
        let vehicle = match (self.found_vehicle_id, self.vehicle_current_mileage) {
            (Some(id), Some(current_mileage)) => Some(Vehicle {
                id,
                name: self.vehicle_name.unwrap_or_default(),
                current_mileage,
            }),
            _ => None,
        };

        AssignedVehicle {
            assignment: self.assignment,
            vehicle,
        }
    }
}

pub struct PgServiceReminderRepository {
    pool: PgPool,
}

impl PgServiceReminderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ServiceReminderRepository for PgServiceReminderRepository {
    async fn delete_orphaned_reminders(&self) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM service_reminders r
            WHERE r.status <> 'COMPLETED'
              AND NOT EXISTS (
                  SELECT 1
                  FROM service_schedules s
                  JOIN vehicle_assignments a
                    ON a.service_program_id = s.service_program_id
                   AND a.vehicle_id = r.vehicle_id
                  JOIN vehicles v ON v.id = a.vehicle_id
                  WHERE s.id = r.service_schedule_id
                    AND NOT s.is_soft_deleted
              )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn refresh_all_reminder_statuses(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let mut tx = self.pool.begin().await?;

        // Si el odómetro retrocede pueden quedar varios UPCOMING por par:
        // solo se conserva el de vencimiento más próximo
        let surplus = sqlx::query(&format!(
            r#"
            {},
            ranked AS (
                SELECT id,
                       row_number() OVER (
                           PARTITION BY vehicle_id, service_schedule_id
                           ORDER BY due_date, due_mileage
                       ) AS position
                FROM classified
                WHERE new_status = 'UPCOMING'
            )
            DELETE FROM service_reminders r
            USING ranked
            WHERE r.id = ranked.id AND ranked.position > 1
            "#,
            CLASSIFIED_REMINDERS_CTE
        ))
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if surplus.rows_affected() > 0 {
            log::debug!(
                "🧹 {} recordatorios UPCOMING sobrantes borrados",
                surplus.rows_affected()
            );
        }

        let result = sqlx::query(&format!(
            r#"
            {}
            UPDATE service_reminders r
            SET status = c.new_status,
                days_until_due = CASE
                    WHEN r.due_date IS NOT NULL
                    THEN trunc(extract(epoch FROM (r.due_date - $1::timestamptz)) / 86400)::bigint
                END,
                current_mileage = CASE WHEN r.due_mileage IS NOT NULL THEN c.current_mileage END,
                mileage_variance = CASE WHEN r.due_mileage IS NOT NULL THEN c.current_mileage - r.due_mileage END,
                updated_at = $1::timestamptz
            FROM classified c
            WHERE r.id = c.id
            "#,
            CLASSIFIED_REMINDERS_CTE
        ))
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(result.rows_affected())
    }

    async fn get_active_schedules_with_tasks_and_assignments(&self) -> AppResult<Vec<ScheduleWithData>> {
        let schedules = sqlx::query_as::<_, ServiceScheduleRow>(
            r#"
            SELECT s.id, s.service_program_id, s.name,
                   s.time_interval_value, s.time_interval_unit,
                   s.time_buffer_value, s.time_buffer_unit,
                   s.mileage_interval, s.mileage_buffer,
                   s.first_service_date, s.first_service_mileage,
                   s.is_active, s.is_soft_deleted
            FROM service_schedules s
            JOIN service_programs p ON p.id = s.service_program_id
            WHERE s.is_active AND NOT s.is_soft_deleted AND p.is_active
            ORDER BY s.name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        if schedules.is_empty() {
            return Ok(Vec::new());
        }

        let schedule_ids: Vec<Uuid> = schedules.iter().map(|s| s.id).collect();
        let program_ids: Vec<Uuid> = schedules.iter().map(|s| s.service_program_id).collect();

        let task_rows = sqlx::query_as::<_, ScheduleTaskRow>(
            r#"
            SELECT st.service_schedule_id, t.id, t.name,
                   t.estimated_labour_hours, t.estimated_cost
            FROM service_schedule_tasks st
            JOIN service_tasks t ON t.id = st.service_task_id
            WHERE st.service_schedule_id = ANY($1) AND NOT t.is_soft_deleted
            "#,
        )
        .bind(&schedule_ids)
        .fetch_all(&self.pool)
        .await?;

        let assignment_rows = sqlx::query_as::<_, AssignmentRow>(
            r#"
            SELECT a.vehicle_id, a.service_program_id, a.added_at,
                   a.vehicle_mileage_at_assignment,
                   v.id AS found_vehicle_id,
                   v.name AS vehicle_name,
                   v.current_mileage AS vehicle_current_mileage
            FROM vehicle_assignments a
            LEFT JOIN vehicles v ON v.id = a.vehicle_id
            WHERE a.service_program_id = ANY($1)
            ORDER BY a.added_at
            "#,
        )
        .bind(&program_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut tasks_by_schedule: HashMap<Uuid, Vec<ServiceTask>> = HashMap::new();
        for row in task_rows {
            tasks_by_schedule
                .entry(row.service_schedule_id)
                .or_default()
                .push(row.task);
        }

        let mut assignments_by_program: HashMap<Uuid, Vec<AssignedVehicle>> = HashMap::new();
        for row in assignment_rows {
            assignments_by_program
                .entry(row.assignment.service_program_id)
                .or_default()
                .push(row.into_assigned_vehicle());
        }

        log::debug!(
            "📥 {} schedules activos cargados con sus tareas y asignaciones",
            schedules.len()
        );

        Ok(schedules
            .into_iter()
            .map(|schedule| ScheduleWithData {
                tasks: tasks_by_schedule.remove(&schedule.id).unwrap_or_default(),
                assignments: assignments_by_program
                    .get(&schedule.service_program_id)
                    .cloned()
                    .unwrap_or_default(),
                schedule,
            })
            .collect())
    }

    async fn insert_new_reminders(&self, snapshots: &[ReminderSnapshot]) -> AppResult<u64> {
        if snapshots.is_empty() {
            return Ok(0);
        }

        let now = Utc::now();
        let mut inserted = 0;
        let mut tx = self.pool.begin().await?;

        let vehicle_ids: Vec<Uuid> = snapshots.iter().map(|s| s.vehicle_id).collect();
        let schedule_ids: Vec<Uuid> = snapshots.iter().map(|s| s.service_schedule_id).collect();
        let due_dates: Vec<Option<DateTime<Utc>>> =
            snapshots.iter().map(|s| s.due_point.date()).collect();
        let due_mileages: Vec<Option<i32>> =
            snapshots.iter().map(|s| s.due_point.mileage()).collect();

        // Un UPCOMING persistido que ya no está en el cálculo quedó obsoleto
        // (el ancla se movió): se borra antes de insertar el nuevo
        let stale = sqlx::query(
            r#"
            WITH calculated AS (
                SELECT *
                FROM UNNEST($1::uuid[], $2::uuid[], $3::timestamptz[], $4::int[])
                    AS c(vehicle_id, service_schedule_id, due_date, due_mileage)
            )
            DELETE FROM service_reminders r
            WHERE r.status = 'UPCOMING'
              AND EXISTS (
                  SELECT 1 FROM calculated c
                  WHERE c.vehicle_id = r.vehicle_id
                    AND c.service_schedule_id = r.service_schedule_id
              )
              AND NOT EXISTS (
                  SELECT 1 FROM calculated c
                  WHERE c.vehicle_id = r.vehicle_id
                    AND c.service_schedule_id = r.service_schedule_id
                    AND c.due_date IS NOT DISTINCT FROM r.due_date
                    AND c.due_mileage IS NOT DISTINCT FROM r.due_mileage
              )
            "#,
        )
        .bind(&vehicle_ids)
        .bind(&schedule_ids)
        .bind(&due_dates)
        .bind(&due_mileages)
        .execute(&mut *tx)
        .await?;

        if stale.rows_affected() > 0 {
            log::debug!(
                "♻️ {} recordatorios UPCOMING obsoletos sustituidos",
                stale.rows_affected()
            );
        }

        for chunk in snapshots.chunks(INSERT_CHUNK_SIZE) {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
                r#"
                INSERT INTO service_reminders (
                    id, vehicle_id, service_schedule_id, service_program_id, schedule_name,
                    due_date, due_mileage, status, task_count,
                    total_estimated_cost, total_estimated_labour_hours,
                    current_mileage, mileage_variance, days_until_due,
                    created_at, updated_at
                )
                "#,
            );

            builder.push_values(chunk, |mut row, snapshot| {
                row.push_bind(Uuid::new_v4())
                    .push_bind(snapshot.vehicle_id)
                    .push_bind(snapshot.service_schedule_id)
                    .push_bind(snapshot.service_program_id)
                    .push_bind(snapshot.schedule_name.clone())
                    .push_bind(snapshot.due_point.date())
                    .push_bind(snapshot.due_point.mileage())
                    .push_bind(snapshot.status)
                    .push_bind(snapshot.task_count)
                    .push_bind(snapshot.total_estimated_cost)
                    .push_bind(snapshot.total_estimated_labour_hours)
                    .push_bind(snapshot.current_mileage)
                    .push_bind(snapshot.mileage_variance)
                    .push_bind(snapshot.days_until_due)
                    .push_bind(now)
                    .push_bind(now);
            });
            builder.push(" ON CONFLICT DO NOTHING");

            let result = builder.build().execute(&mut *tx).await?;
            inserted += result.rows_affected();
        }

        tx.commit().await?;

        Ok(inserted)
    }
}
