//! Services module
//!
//! Este módulo contiene la lógica de negocio del motor de recordatorios:
//! validación de schedules, generación y clasificación de ocurrencias,
//! ensamblado de snapshots y la orquestación de la sincronización.

pub mod occurrence_sequencer;
pub mod reminder_assembler;
pub mod reminder_sync_job;
pub mod reminder_sync_service;
pub mod schedule_guard;
pub mod status_classifier;
pub mod sync_lease;

pub use occurrence_sequencer::{CalculatedOccurrence, OccurrenceSequence};
pub use reminder_assembler::{ReminderAssembler, TaskTotals};
pub use reminder_sync_job::ReminderSyncJob;
pub use reminder_sync_service::{calculate_reminders, ReminderCalculation, ServiceReminderSyncService};
pub use sync_lease::{LeaseToken, LocalSyncLease, RedisSyncLease, SyncLease};
