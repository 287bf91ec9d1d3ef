//! Modelo de Vehicle y asignaciones a programas de servicio
//!
//! Este módulo contiene las vistas de solo lectura que el motor de
//! recordatorios necesita: el vehículo con su kilometraje actual y la
//! asignación vehículo ↔ programa de servicio.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Vehicle - solo los campos que usa el cálculo de recordatorios
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct Vehicle {
    pub id: Uuid,
    pub name: String,
    pub current_mileage: i32,
}

/// Asignación de un vehículo a un programa de servicio - tabla vehicle_assignments
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct VehicleAssignment {
    pub vehicle_id: Uuid,
    pub service_program_id: Uuid,
    pub added_at: DateTime<Utc>,
    /// Kilometraje en el momento de la asignación
    pub vehicle_mileage_at_assignment: Option<i32>,
}

/// Asignación junto al vehículo resuelto.
///
/// `vehicle` es `None` cuando la asignación apunta a un vehículo que ya no
/// existe; el orquestador la omite sin abortar la sincronización.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignedVehicle {
    pub assignment: VehicleAssignment,
    pub vehicle: Option<Vehicle>,
}

impl VehicleAssignment {
    /// Kilometraje base para schedules sin primer servicio explícito
    pub fn baseline_mileage(&self, vehicle: &Vehicle) -> i32 {
        self.vehicle_mileage_at_assignment
            .unwrap_or(vehicle.current_mileage)
    }
}
