//! DTOs
//!
//! Estructuras expuestas hacia fuera del motor (job programado, trigger HTTP).

pub mod service_reminder_dto;

pub use service_reminder_dto::SyncResult;
