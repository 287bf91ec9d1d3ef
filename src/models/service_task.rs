//! Modelo de ServiceTask

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Tarea de mantenimiento enlazada a un schedule
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct ServiceTask {
    pub id: Uuid,
    pub name: String,
    pub estimated_labour_hours: Option<Decimal>,
    pub estimated_cost: Option<Decimal>,
}
