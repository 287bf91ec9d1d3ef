use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::{TimeZone, Utc};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

use fleet_reminders::metrics::Metrics;
use fleet_reminders::models::{ServiceScheduleRow, ServiceTask, Vehicle, VehicleAssignment};
use fleet_reminders::repositories::InMemoryReminderRepository;
use fleet_reminders::routes::create_app;
use fleet_reminders::services::{LocalSyncLease, ServiceReminderSyncService};
use fleet_reminders::state::AppState;
use fleet_reminders::utils::FixedClock;

fn create_test_app() -> (Router, Arc<InMemoryReminderRepository>) {
    let repository = Arc::new(InMemoryReminderRepository::new());
    let metrics = Arc::new(Metrics::new().unwrap());
    let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap());
    let service = ServiceReminderSyncService::new(
        repository.clone(),
        Arc::new(clock),
        Arc::new(LocalSyncLease::new()),
    )
    .with_metrics(metrics.clone());

    let app = create_app(AppState::new(Arc::new(service), metrics));
    (app, repository)
}

fn seed_mileage_schedule(repository: &InMemoryReminderRepository) {
    let program_id = Uuid::new_v4();
    let vehicle_id = Uuid::new_v4();

    repository.add_schedule(
        ServiceScheduleRow {
            id: Uuid::new_v4(),
            service_program_id: program_id,
            name: "Brake inspection".to_string(),
            time_interval_value: None,
            time_interval_unit: None,
            time_buffer_value: None,
            time_buffer_unit: None,
            mileage_interval: Some(5000),
            mileage_buffer: Some(500),
            first_service_date: None,
            first_service_mileage: Some(10_000),
            is_active: true,
            is_soft_deleted: false,
        },
        vec![ServiceTask {
            id: Uuid::new_v4(),
            name: "Inspect pads".to_string(),
            estimated_labour_hours: None,
            estimated_cost: None,
        }],
    );
    repository.add_vehicle(Vehicle {
        id: vehicle_id,
        name: "Van 7".to_string(),
        current_mileage: 22_300,
    });
    repository.assign_vehicle(VehicleAssignment {
        vehicle_id,
        service_program_id: program_id,
        added_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        vehicle_mileage_at_assignment: None,
    });
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let (app, _) = create_test_app();

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["service"], "fleet-reminders");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_sync_endpoint_returns_sync_result() {
    let (app, repository) = create_test_app();
    seed_mileage_schedule(&repository);

    let response = app
        .oneshot(
            Request::post("/api/service-reminders/sync")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["generated_count"], 4);
    assert_eq!(body["error_message"], serde_json::Value::Null);
    assert_eq!(repository.reminders().len(), 4);
}

#[tokio::test]
async fn test_metrics_endpoint_exposes_sync_counters() {
    let (app, repository) = create_test_app();
    seed_mileage_schedule(&repository);

    let response = app
        .clone()
        .oneshot(
            Request::post("/api/service-reminders/sync")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("reminders_generated_total 4"), "{}", text);
    assert!(text.contains("reminder_sync_runs_total 1"), "{}", text);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let (app, _) = create_test_app();

    let response = app
        .oneshot(
            Request::get("/api/service-reminders/unknown")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
