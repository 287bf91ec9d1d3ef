//! Sistema de manejo de errores
//!
//! Este módulo define todos los tipos de errores del motor de recordatorios
//! y su conversión a respuestas HTTP apropiadas.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Configuración corrupta de un schedule: fatal para toda la sincronización
    #[error("Invalid service schedule {schedule_id}: {reason}")]
    InvalidSchedule { schedule_id: Uuid, reason: String },

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("sync cancelled")]
    Cancelled,

    #[error("sync already in progress")]
    SyncInProgress,

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<redis::RedisError> for AppError {
    fn from(e: redis::RedisError) -> Self {
        AppError::Cache(e.to_string())
    }
}

/// Respuesta de error para la API
#[derive(Debug, serde::Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_response) = match self {
            AppError::Database(e) => {
                log::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "Database Error".to_string(),
                        message: "An error occurred while accessing the database".to_string(),
                        details: Some(json!({ "sql_error": e.to_string() })),
                        code: Some("DB_ERROR".to_string()),
                    },
                )
            }

            AppError::InvalidSchedule { schedule_id, reason } => {
                log::error!("Invalid schedule {}: {}", schedule_id, reason);
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    ErrorResponse {
                        error: "Invalid Schedule".to_string(),
                        message: reason,
                        details: Some(json!({ "schedule_id": schedule_id })),
                        code: Some("INVALID_SCHEDULE".to_string()),
                    },
                )
            }

            AppError::Cache(msg) => {
                log::error!("Cache error: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ErrorResponse {
                        error: "Cache Error".to_string(),
                        message: "An error occurred while accessing the cache".to_string(),
                        details: Some(json!({ "cache_error": msg })),
                        code: Some("CACHE_ERROR".to_string()),
                    },
                )
            }

            AppError::Cancelled => {
                log::warn!("Sync cancelled");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ErrorResponse {
                        error: "Cancelled".to_string(),
                        message: "The operation was cancelled".to_string(),
                        details: None,
                        code: Some("CANCELLED".to_string()),
                    },
                )
            }

            AppError::SyncInProgress => {
                log::warn!("Sync already in progress");
                (
                    StatusCode::CONFLICT,
                    ErrorResponse {
                        error: "Conflict".to_string(),
                        message: "A reminder sync is already running".to_string(),
                        details: None,
                        code: Some("SYNC_IN_PROGRESS".to_string()),
                    },
                )
            }

            AppError::Internal(msg) => {
                log::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "Internal Server Error".to_string(),
                        message: "An unexpected error occurred".to_string(),
                        details: Some(json!({ "internal_error": msg })),
                        code: Some("INTERNAL_ERROR".to_string()),
                    },
                )
            }
        };

        (status, Json(error_response)).into_response()
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;

/// Función helper para crear errores de configuración de schedule
pub fn invalid_schedule_error(schedule_id: Uuid, reason: impl Into<String>) -> AppError {
    AppError::InvalidSchedule {
        schedule_id,
        reason: reason.into(),
    }
}
