//! Controllers
//!
//! Capa entre las rutas HTTP y los servicios.

pub mod service_reminder_controller;

pub use service_reminder_controller::ServiceReminderController;
