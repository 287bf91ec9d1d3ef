//! Validación del tipo de schedule
//!
//! Un schedule es por tiempo O por kilometraje, nunca ambos ni ninguno.
//! Aquí la fila anulable de la base de datos se convierte en `ScheduleRule`;
//! cualquier inconsistencia es un error de configuración fatal.

use log::warn;
use validator::Validate;

use crate::models::service_schedule::{MileageRule, ScheduleRule, ServiceScheduleRow, TimeRule};
use crate::utils::errors::{invalid_schedule_error, AppResult};

/// Validar un schedule y devolver su regla de recurrencia tipada
pub fn validate(row: &ServiceScheduleRow) -> AppResult<ScheduleRule> {
    row.validate()
        .map_err(|e| invalid_schedule_error(row.id, format!("out-of-range values: {}", e)))?;

    let time_interval = match (row.time_interval_value, row.time_interval_unit) {
        (Some(value), Some(unit)) => Some((value, unit)),
        (None, None) => None,
        _ => {
            return Err(invalid_schedule_error(
                row.id,
                "time interval value and unit must be set together",
            ))
        }
    };

    match (time_interval, row.mileage_interval) {
        (Some(_), Some(_)) => Err(invalid_schedule_error(
            row.id,
            "schedule has both a time interval and a mileage interval",
        )),
        (None, None) => Err(invalid_schedule_error(
            row.id,
            "schedule has neither a time interval nor a mileage interval",
        )),
        (Some((interval_value, interval_unit)), None) => {
            if row.mileage_buffer.is_some() || row.first_service_mileage.is_some() {
                warn!(
                    "⚠️ Schedule {} es por tiempo; se ignoran los campos de kilometraje",
                    row.id
                );
            }

            Ok(ScheduleRule::TimeBased(TimeRule {
                interval_value,
                interval_unit,
                buffer_value: row.time_buffer_value.unwrap_or(0),
                buffer_unit: row.time_buffer_unit.unwrap_or(interval_unit),
                first_service_date: row.first_service_date,
            }))
        }
        (None, Some(interval)) => {
            if row.time_buffer_value.is_some() || row.first_service_date.is_some() {
                warn!(
                    "⚠️ Schedule {} es por kilometraje; se ignoran los campos de tiempo",
                    row.id
                );
            }

            Ok(ScheduleRule::MileageBased(MileageRule {
                interval,
                buffer: row.mileage_buffer.unwrap_or(0),
                first_service_mileage: row.first_service_mileage,
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::service_schedule::TimeIntervalUnit;
    use crate::utils::errors::AppError;
    use uuid::Uuid;

    fn empty_row() -> ServiceScheduleRow {
        ServiceScheduleRow {
            id: Uuid::new_v4(),
            service_program_id: Uuid::new_v4(),
            name: "Oil change".to_string(),
            time_interval_value: None,
            time_interval_unit: None,
            time_buffer_value: None,
            time_buffer_unit: None,
            mileage_interval: None,
            mileage_buffer: None,
            first_service_date: None,
            first_service_mileage: None,
            is_active: true,
            is_soft_deleted: false,
        }
    }

    fn assert_invalid(row: &ServiceScheduleRow) {
        match validate(row) {
            Err(AppError::InvalidSchedule { schedule_id, .. }) => assert_eq!(schedule_id, row.id),
            other => panic!("expected InvalidSchedule, got {:?}", other),
        }
    }

    #[test]
    fn test_time_based_schedule() {
        let mut row = empty_row();
        row.time_interval_value = Some(30);
        row.time_interval_unit = Some(TimeIntervalUnit::Days);
        row.time_buffer_value = Some(7);
        row.time_buffer_unit = Some(TimeIntervalUnit::Days);

        let rule = validate(&row).unwrap();
        assert_eq!(
            rule,
            ScheduleRule::TimeBased(TimeRule {
                interval_value: 30,
                interval_unit: TimeIntervalUnit::Days,
                buffer_value: 7,
                buffer_unit: TimeIntervalUnit::Days,
                first_service_date: None,
            })
        );
    }

    #[test]
    fn test_mileage_based_schedule() {
        let mut row = empty_row();
        row.mileage_interval = Some(5000);
        row.mileage_buffer = Some(500);
        row.first_service_mileage = Some(10000);

        let rule = validate(&row).unwrap();
        assert_eq!(
            rule,
            ScheduleRule::MileageBased(MileageRule {
                interval: 5000,
                buffer: 500,
                first_service_mileage: Some(10000),
            })
        );
    }

    #[test]
    fn test_both_rules_is_fatal() {
        let mut row = empty_row();
        row.time_interval_value = Some(30);
        row.time_interval_unit = Some(TimeIntervalUnit::Days);
        row.mileage_interval = Some(5000);
        assert_invalid(&row);
    }

    #[test]
    fn test_neither_rule_is_fatal() {
        assert_invalid(&empty_row());
    }

    #[test]
    fn test_half_set_time_interval_is_fatal() {
        let mut row = empty_row();
        row.time_interval_value = Some(30);
        assert_invalid(&row);
    }

    #[test]
    fn test_non_positive_interval_is_fatal() {
        let mut row = empty_row();
        row.mileage_interval = Some(0);
        assert_invalid(&row);

        let mut row = empty_row();
        row.time_interval_value = Some(-1);
        row.time_interval_unit = Some(TimeIntervalUnit::Hours);
        assert_invalid(&row);
    }

    #[test]
    fn test_negative_buffer_is_fatal() {
        let mut row = empty_row();
        row.mileage_interval = Some(1000);
        row.mileage_buffer = Some(-10);
        assert_invalid(&row);
    }

    #[test]
    fn test_buffer_defaults() {
        let mut row = empty_row();
        row.time_interval_value = Some(2);
        row.time_interval_unit = Some(TimeIntervalUnit::Weeks);
        row.time_buffer_value = Some(3);

        match validate(&row).unwrap() {
            ScheduleRule::TimeBased(rule) => {
                assert_eq!(rule.buffer_unit, TimeIntervalUnit::Weeks);
                assert_eq!(rule.buffer(), chrono::Duration::days(21));
            }
            other => panic!("expected time rule, got {:?}", other),
        }

        let mut row = empty_row();
        row.mileage_interval = Some(1000);
        assert_eq!(validate(&row).unwrap().mileage_buffer(), 0);
    }
}
