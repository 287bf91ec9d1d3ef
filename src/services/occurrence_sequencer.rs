//! Generador de ocurrencias de mantenimiento
//!
//! Produce, de forma perezosa, los puntos de vencimiento de un schedule para
//! un vehículo: desde el ancla, avanzando un intervalo cada vez, y se detiene
//! justo después del primer punto UPCOMING (incluido).

use chrono::{DateTime, Duration, Utc};

use crate::models::service_reminder::{DuePoint, ServiceReminderStatus};
use crate::models::service_schedule::{MileageRule, ScheduleRule, TimeRule};
use crate::models::vehicle::{Vehicle, VehicleAssignment};
use crate::services::status_classifier::{classify_date, classify_mileage};

/// Punto de vencimiento ya clasificado
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalculatedOccurrence {
    pub due_point: DuePoint,
    pub status: ServiceReminderStatus,
}

#[derive(Debug, Clone)]
enum Cursor {
    Time {
        next: DateTime<Utc>,
        step: Duration,
        buffer: Duration,
        now: DateTime<Utc>,
    },
    Mileage {
        next: i32,
        step: i32,
        buffer: i32,
        current: i32,
    },
}

/// Secuencia finita y estrictamente creciente de ocurrencias
#[derive(Debug, Clone)]
pub struct OccurrenceSequence {
    cursor: Option<Cursor>,
}

impl OccurrenceSequence {
    /// Secuencia para un par (schedule, vehículo asignado)
    pub fn new(
        rule: &ScheduleRule,
        assignment: &VehicleAssignment,
        vehicle: &Vehicle,
        now: DateTime<Utc>,
    ) -> Self {
        match rule {
            ScheduleRule::TimeBased(rule) => Self::for_time(rule, assignment.added_at, now),
            ScheduleRule::MileageBased(rule) => Self::for_mileage(
                rule,
                assignment.baseline_mileage(vehicle),
                vehicle.current_mileage,
            ),
        }
    }

    /// Ancla: primer servicio explícito, o asignación + 1 intervalo
    pub fn for_time(rule: &TimeRule, assigned_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let step = rule.interval();
        let anchor = match rule.first_service_date {
            Some(first) => Some(first),
            None => assigned_at.checked_add_signed(step),
        };

        Self {
            cursor: anchor.map(|next| Cursor::Time {
                next,
                step,
                buffer: rule.buffer(),
                now,
            }),
        }
    }

    /// Ancla: primer servicio explícito, o kilometraje base + 1 intervalo
    pub fn for_mileage(rule: &MileageRule, baseline_mileage: i32, current_mileage: i32) -> Self {
        let anchor = match rule.first_service_mileage {
            Some(first) => Some(first),
            None => baseline_mileage.checked_add(rule.interval),
        };

        Self {
            cursor: anchor.map(|next| Cursor::Mileage {
                next,
                step: rule.interval,
                buffer: rule.buffer,
                current: current_mileage,
            }),
        }
    }
}

impl Iterator for OccurrenceSequence {
    type Item = CalculatedOccurrence;

    fn next(&mut self) -> Option<Self::Item> {
        let cursor = self.cursor.as_mut()?;

        let (occurrence, advanced) = match cursor {
            Cursor::Time {
                next,
                step,
                buffer,
                now,
            } => {
                let occurrence = CalculatedOccurrence {
                    due_point: DuePoint::Date(*next),
                    status: classify_date(*next, *now, *buffer),
                };
                let advanced = match next.checked_add_signed(*step) {
                    Some(following) => {
                        *next = following;
                        true
                    }
                    None => false,
                };
                (occurrence, advanced)
            }
            Cursor::Mileage {
                next,
                step,
                buffer,
                current,
            } => {
                let occurrence = CalculatedOccurrence {
                    due_point: DuePoint::Mileage(*next),
                    status: classify_mileage(*next, *current, *buffer),
                };
                let advanced = match next.checked_add(*step) {
                    Some(following) => {
                        *next = following;
                        true
                    }
                    None => false,
                };
                (occurrence, advanced)
            }
        };

        if occurrence.status == ServiceReminderStatus::Upcoming || !advanced {
            self.cursor = None;
        }

        Some(occurrence)
    }
}

impl std::iter::FusedIterator for OccurrenceSequence {}
