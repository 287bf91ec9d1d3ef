//! Utilidades del sistema
//!
//! Este módulo contiene utilidades para manejo de errores y la fuente de
//! tiempo compartida por el motor.

pub mod clock;
pub mod errors;

pub use clock::{Clock, FixedClock, SystemClock};
pub use errors::{AppError, AppResult};
