//! Modelos del sistema
//!
//! Este módulo contiene los modelos de datos del motor de recordatorios de
//! mantenimiento, mapeados al schema PostgreSQL de `migrations/`.

pub mod service_reminder;
pub mod service_schedule;
pub mod service_task;
pub mod vehicle;

pub use service_reminder::*;
pub use service_schedule::*;
pub use service_task::*;
pub use vehicle::*;
