//! Modelo de ServiceSchedule
//!
//! Este módulo contiene la fila de `service_schedules` tal como se guarda en
//! PostgreSQL y la regla de recurrencia tipada (`ScheduleRule`) que el motor
//! de recordatorios usa una vez validada.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use uuid::Uuid;
use validator::Validate;

pub const HOURS_PER_DAY: i64 = 24;
pub const DAYS_PER_WEEK: i64 = 7;

/// Unidad de intervalo - mapea al ENUM time_interval_unit
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "time_interval_unit", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeIntervalUnit {
    Hours,
    Days,
    Weeks,
}

impl TimeIntervalUnit {
    /// Horas que representa una unidad
    pub fn hours_per_unit(self) -> i64 {
        match self {
            TimeIntervalUnit::Hours => 1,
            TimeIntervalUnit::Days => HOURS_PER_DAY,
            TimeIntervalUnit::Weeks => DAYS_PER_WEEK * HOURS_PER_DAY,
        }
    }

    /// Convertir `value` unidades a una duración de chrono
    pub fn duration(self, value: i32) -> Duration {
        Duration::hours(i64::from(value) * self.hours_per_unit())
    }
}

/// ServiceSchedule principal - mapea exactamente a la tabla service_schedules
///
/// Los pares anulables (tiempo / kilometraje) reflejan el almacenamiento; el
/// motor nunca los lee directamente, pasa siempre por `schedule_guard`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Validate)]
pub struct ServiceScheduleRow {
    pub id: Uuid,
    pub service_program_id: Uuid,
    pub name: String,

    #[validate(range(min = 1))]
    pub time_interval_value: Option<i32>,
    pub time_interval_unit: Option<TimeIntervalUnit>,

    #[validate(range(min = 0))]
    pub time_buffer_value: Option<i32>,
    pub time_buffer_unit: Option<TimeIntervalUnit>,

    #[validate(range(min = 1))]
    pub mileage_interval: Option<i32>,

    #[validate(range(min = 0))]
    pub mileage_buffer: Option<i32>,

    pub first_service_date: Option<DateTime<Utc>>,

    #[validate(range(min = 0))]
    pub first_service_mileage: Option<i32>,

    pub is_active: bool,
    pub is_soft_deleted: bool,
}

/// Regla de recurrencia basada en tiempo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeRule {
    pub interval_value: i32,
    pub interval_unit: TimeIntervalUnit,
    pub buffer_value: i32,
    pub buffer_unit: TimeIntervalUnit,
    pub first_service_date: Option<DateTime<Utc>>,
}

impl TimeRule {
    pub fn interval(&self) -> Duration {
        self.interval_unit.duration(self.interval_value)
    }

    pub fn buffer(&self) -> Duration {
        self.buffer_unit.duration(self.buffer_value)
    }
}

/// Regla de recurrencia basada en kilometraje
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MileageRule {
    pub interval: i32,
    pub buffer: i32,
    pub first_service_mileage: Option<i32>,
}

/// Exactamente una regla por schedule: tiempo O kilometraje
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleRule {
    TimeBased(TimeRule),
    MileageBased(MileageRule),
}

impl ScheduleRule {
    /// Ventana DUE_SOON en tiempo (cero para schedules por kilometraje)
    pub fn time_buffer(&self) -> Duration {
        match self {
            ScheduleRule::TimeBased(rule) => rule.buffer(),
            ScheduleRule::MileageBased(_) => Duration::zero(),
        }
    }

    /// Ventana DUE_SOON en kilometraje (cero para schedules por tiempo)
    pub fn mileage_buffer(&self) -> i32 {
        match self {
            ScheduleRule::TimeBased(_) => 0,
            ScheduleRule::MileageBased(rule) => rule.buffer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_durations() {
        assert_eq!(TimeIntervalUnit::Hours.duration(5), Duration::hours(5));
        assert_eq!(TimeIntervalUnit::Days.duration(3), Duration::days(3));
        assert_eq!(TimeIntervalUnit::Weeks.duration(2), Duration::days(14));
    }

    #[test]
    fn test_rule_buffers_are_domain_specific() {
        let time = ScheduleRule::TimeBased(TimeRule {
            interval_value: 30,
            interval_unit: TimeIntervalUnit::Days,
            buffer_value: 1,
            buffer_unit: TimeIntervalUnit::Weeks,
            first_service_date: None,
        });
        assert_eq!(time.time_buffer(), Duration::days(7));
        assert_eq!(time.mileage_buffer(), 0);

        let mileage = ScheduleRule::MileageBased(MileageRule {
            interval: 5000,
            buffer: 500,
            first_service_mileage: None,
        });
        assert_eq!(mileage.time_buffer(), Duration::zero());
        assert_eq!(mileage.mileage_buffer(), 500);
    }
}
