//! Repositorios
//!
//! Acceso a datos del motor de recordatorios: el contrato consumido por el
//! orquestador, su implementación PostgreSQL y una implementación en memoria.

pub mod in_memory_reminder_repository;
pub mod service_reminder_repository;

pub use in_memory_reminder_repository::{InMemoryReminderRepository, RepositoryCall};
pub use service_reminder_repository::{PgServiceReminderRepository, ServiceReminderRepository};
