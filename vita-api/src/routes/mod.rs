//! REST API Routes Module
//!
//! Route handlers organized by record kind, plus stats, health, and the
//! OpenAPI document. Routers are generic over `AppState`; handlers extract
//! the state slices they need via `FromRef`.

pub mod body_record;
pub mod diary;
pub mod exercise;
pub mod generic;
pub mod goal;
pub mod health;
pub mod meal;
pub mod stats;

use axum::{
    http::{header, HeaderValue, Method},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::config::ApiConfig;
use crate::openapi::ApiDoc;
use crate::state::AppState;

// Re-export route creation functions for convenience
pub use body_record::create_router as body_record_router;
pub use diary::create_router as diary_router;
pub use exercise::create_router as exercise_router;
pub use goal::create_router as goal_router;
pub use health::create_router as health_router;
pub use meal::create_router as meal_router;
pub use stats::create_router as stats_router;

/// Handler for /openapi.json endpoint.
async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

/// Build the CORS layer from configuration. An empty origin list allows
/// everything (dev mode).
fn build_cors(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(std::time::Duration::from_secs(config.cors_max_age_secs));

    if config.cors_origins.is_empty() {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        cors.allow_origin(AllowOrigin::list(origins))
    }
}

/// Assemble the full application router.
pub fn create_api_router(state: AppState, config: &ApiConfig) -> Router {
    let records = Router::new()
        .nest("/body-records", body_record_router())
        .nest("/meals", meal_router())
        .nest("/exercises", exercise_router())
        .nest("/diaries", diary_router())
        .nest("/goals", goal_router());

    let api = Router::new()
        .nest("/records", records)
        .nest("/stats", stats_router())
        .nest("/health", health_router());

    Router::new()
        .nest("/api/v1", api)
        .route("/openapi.json", get(openapi_json))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors(config))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthConfig;
    use crate::jobs::JobQueue;
    use std::sync::Arc;
    use vita_test_utils::{MemoryCache, MemoryStore};

    #[test]
    fn test_router_builds() {
        let store = Arc::new(MemoryStore::new());
        let cache = Arc::new(MemoryCache::new());
        let (jobs, _rx) = JobQueue::new(8);
        let auth = AuthConfig {
            jwt_secret: "test".to_string(),
        };
        let state = AppState::new(store, cache, jobs, auth);
        let _router = create_api_router(state, &ApiConfig::default());
    }

    #[test]
    fn test_cors_with_explicit_origins() {
        let config = ApiConfig {
            cors_origins: vec!["https://app.vita.example".to_string()],
            ..ApiConfig::default()
        };
        let _layer = build_cors(&config);
    }
}
