//! Statistics REST API routes.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};

use vita_core::UserId;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::jobs::{JobQueue, StatsJob};
use crate::services::StatsEngine;
use crate::state::AppState;
use crate::types::{AchievementRateResponse, StatsQuery, TriggerQuery, TriggerResponse};
use crate::validation::resolve_window_days;

/// GET /api/v1/stats/achievement-rate - Current user's achievement rate
#[utoipa::path(
    get,
    path = "/api/v1/stats/achievement-rate",
    tag = "Stats",
    params(StatsQuery),
    responses(
        (status = 200, description = "Achievement rate", body = AchievementRateResponse),
        (status = 400, description = "window_days out of range", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_achievement_rate(
    State(stats): State<Arc<StatsEngine>>,
    AuthUser(user_id): AuthUser,
    Query(query): Query<StatsQuery>,
) -> ApiResult<Json<AchievementRateResponse>> {
    let window_days = resolve_window_days(query.window_days)?;
    let read = stats.get(user_id, window_days).await?;
    Ok(Json(AchievementRateResponse::new(
        read.stat,
        read.cached,
        None,
    )))
}

/// GET /api/v1/stats/achievement-rate/user/{user_id} - Another user's rate
#[utoipa::path(
    get,
    path = "/api/v1/stats/achievement-rate/user/{user_id}",
    tag = "Stats",
    params(("user_id" = i64, Path, description = "Target user id"), StatsQuery),
    responses(
        (status = 200, description = "Achievement rate", body = AchievementRateResponse),
        (status = 400, description = "window_days out of range", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_achievement_rate_for_user(
    State(stats): State<Arc<StatsEngine>>,
    AuthUser(_caller): AuthUser,
    Path(target): Path<UserId>,
    Query(query): Query<StatsQuery>,
) -> ApiResult<Json<AchievementRateResponse>> {
    let window_days = resolve_window_days(query.window_days)?;
    let read = stats.get(target, window_days).await?;
    Ok(Json(AchievementRateResponse::new(
        read.stat,
        read.cached,
        Some(target),
    )))
}

/// POST /api/v1/stats/achievement-rate/trigger - Manual recomputation
///
/// With `user_id` the job recomputes one user; without it the full sweep is
/// enqueued.
#[utoipa::path(
    post,
    path = "/api/v1/stats/achievement-rate/trigger",
    tag = "Stats",
    params(TriggerQuery),
    responses(
        (status = 200, description = "Job enqueued", body = TriggerResponse),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn trigger_achievement_rate(
    State(jobs): State<JobQueue>,
    AuthUser(_caller): AuthUser,
    Query(query): Query<TriggerQuery>,
) -> ApiResult<Json<TriggerResponse>> {
    let (job, message) = match query.user_id {
        Some(user_id) => (
            StatsJob::ComputeOne {
                user_id,
                window_days: vita_core::DEFAULT_WINDOW_DAYS,
            },
            format!("Achievement rate calculation triggered for user {}", user_id),
        ),
        None => (
            StatsJob::ComputeAll {
                window_days: vita_core::DEFAULT_WINDOW_DAYS,
            },
            "Achievement rate calculation triggered for all users".to_string(),
        ),
    };

    let job_id = jobs.enqueue(job);
    if job_id.is_none() {
        tracing::warn!("Manual stats trigger rejected by a saturated queue");
    }
    Ok(Json(TriggerResponse { message, job_id }))
}

/// Create the stats routes router.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/achievement-rate", get(get_achievement_rate))
        .route(
            "/achievement-rate/user/:user_id",
            get(get_achievement_rate_for_user),
        )
        .route(
            "/achievement-rate/trigger",
            post(trigger_achievement_rate),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use vita_test_utils::{MemoryCache, store_with_goal_scenario};

    async fn engine_with_scenario() -> (Arc<StatsEngine>, UserId) {
        let today = chrono::Utc::now().date_naive();
        let (store, user) = store_with_goal_scenario(4, 2, today).await;
        let cache = Arc::new(MemoryCache::new());
        (Arc::new(StatsEngine::new(store, cache)), user.id)
    }

    #[tokio::test]
    async fn test_end_to_end_fifty_percent() {
        let (stats, user_id) = engine_with_scenario().await;

        let Json(first) = get_achievement_rate(
            State(stats.clone()),
            AuthUser(user_id),
            Query(StatsQuery::default()),
        )
        .await
        .unwrap();
        assert_eq!(first.achievement_rate, 50.0);
        assert_eq!(first.completed_goals, 2);
        assert_eq!(first.total_goals, 4);
        assert_eq!(first.window_days, 30);
        assert!(!first.cached);

        // Second read is a cache hit with the same payload.
        let Json(second) = get_achievement_rate(
            State(stats),
            AuthUser(user_id),
            Query(StatsQuery::default()),
        )
        .await
        .unwrap();
        assert!(second.cached);
        assert_eq!(second.achievement_rate, 50.0);
    }

    #[tokio::test]
    async fn test_window_out_of_range_rejected() {
        let (stats, user_id) = engine_with_scenario().await;
        let err = get_achievement_rate(
            State(stats),
            AuthUser(user_id),
            Query(StatsQuery {
                window_days: Some(0),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidRange);
    }

    #[tokio::test]
    async fn test_per_user_read_carries_target_id() {
        let (stats, user_id) = engine_with_scenario().await;
        let Json(resp) = get_achievement_rate_for_user(
            State(stats),
            AuthUser(999), // any authenticated caller
            Path(user_id),
            Query(StatsQuery::default()),
        )
        .await
        .unwrap();
        assert_eq!(resp.user_id, Some(user_id));
        assert_eq!(resp.achievement_rate, 50.0);
    }

    #[tokio::test]
    async fn test_trigger_specific_and_sweep() {
        let (queue, mut rx) = JobQueue::new(8);

        let Json(resp) = trigger_achievement_rate(
            State(queue.clone()),
            AuthUser(1),
            Query(TriggerQuery { user_id: Some(7) }),
        )
        .await
        .unwrap();
        assert!(resp.job_id.is_some());
        assert!(resp.message.contains("user 7"));
        let (_, job) = rx.try_recv_job().unwrap();
        assert!(matches!(job, StatsJob::ComputeOne { user_id: 7, .. }));

        let Json(resp) = trigger_achievement_rate(
            State(queue),
            AuthUser(1),
            Query(TriggerQuery { user_id: None }),
        )
        .await
        .unwrap();
        assert!(resp.message.contains("all users"));
        let (_, job) = rx.try_recv_job().unwrap();
        assert!(matches!(job, StatsJob::ComputeAll { .. }));
    }
}
