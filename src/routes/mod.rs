//! Rutas HTTP
//!
//! Superficie mínima del servicio: health check, métricas y el trigger
//! manual de la sincronización de recordatorios.

pub mod service_reminder_routes;

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::utils::errors::AppError;

/// Construir el router completo de la aplicación
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .nest(
            "/api/service-reminders",
            service_reminder_routes::create_service_reminder_router(),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "service": "fleet-reminders",
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn metrics(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let body = state.metrics.render()?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    ))
}
