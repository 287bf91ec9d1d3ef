use axum::{extract::State, routing::post, Json, Router};

use crate::controllers::service_reminder_controller::ServiceReminderController;
use crate::dto::SyncResult;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_service_reminder_router() -> Router<AppState> {
    Router::new().route("/sync", post(trigger_sync))
}

async fn trigger_sync(State(state): State<AppState>) -> Result<Json<SyncResult>, AppError> {
    let controller = ServiceReminderController::new(state.sync_service.clone());
    let result = controller.trigger_sync().await?;
    Ok(Json(result))
}
