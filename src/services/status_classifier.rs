//! Clasificación de estado de un punto de vencimiento
//!
//! - OVERDUE: referencia ≥ vencimiento
//! - DUE_SOON: vencimiento − buffer ≤ referencia < vencimiento
//! - UPCOMING: referencia < vencimiento − buffer
//!
//! Un buffer de cero deja DUE_SOON como un límite instantáneo.

use chrono::{DateTime, Duration, Utc};

use crate::models::service_reminder::{DuePoint, ServiceReminderStatus};
use crate::models::service_schedule::ScheduleRule;

/// Clasificar un vencimiento por fecha
pub fn classify_date(
    due_date: DateTime<Utc>,
    now: DateTime<Utc>,
    buffer: Duration,
) -> ServiceReminderStatus {
    if now >= due_date {
        return ServiceReminderStatus::Overdue;
    }

    match due_date.checked_sub_signed(buffer) {
        Some(window_start) if now < window_start => ServiceReminderStatus::Upcoming,
        _ => ServiceReminderStatus::DueSoon,
    }
}

/// Clasificar un vencimiento por kilometraje
pub fn classify_mileage(due_mileage: i32, current_mileage: i32, buffer: i32) -> ServiceReminderStatus {
    let due = i64::from(due_mileage);
    let current = i64::from(current_mileage);

    if current >= due {
        ServiceReminderStatus::Overdue
    } else if current >= due - i64::from(buffer) {
        ServiceReminderStatus::DueSoon
    } else {
        ServiceReminderStatus::Upcoming
    }
}

/// Clasificar cualquier punto de vencimiento con el buffer de su regla
pub fn classify_due_point(
    due_point: &DuePoint,
    rule: &ScheduleRule,
    now: DateTime<Utc>,
    current_mileage: i32,
) -> ServiceReminderStatus {
    match due_point {
        DuePoint::Date(due_date) => classify_date(*due_date, now, rule.time_buffer()),
        DuePoint::Mileage(due_mileage) => {
            classify_mileage(*due_mileage, current_mileage, rule.mileage_buffer())
        }
    }
}
