//! Health check endpoint.

use axum::{extract::State, routing::get, Json, Router};

use crate::state::AppState;
use crate::types::HealthResponse;

/// GET /api/v1/health - Liveness check
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "Health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health(State(start_time): State<std::time::Instant>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs: start_time.elapsed().as_secs(),
    })
}

/// Create the health routes router.
pub fn create_router() -> Router<AppState> {
    Router::new().route("/", get(health))
}
