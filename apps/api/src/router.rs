use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::json;

use scheduling_cell::router::appointment_routes;
use scheduling_cell::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Appointment scheduling API is running!" }))
        .route(
            "/health",
            get(|| async { Json(json!({ "status": "healthy", "service": "appointments" })) }),
        )
        .nest("/appointments", appointment_routes(state))
}
