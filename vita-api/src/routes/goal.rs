//! Goal and goal-progress REST API routes.
//!
//! Progress entries are nested under their parent goal. Every nested
//! handler resolves the goal through the caller's ownership scope first, so
//! a foreign goal 404s before any progress id is even looked at.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use vita_core::{
    Goal, GoalFilter, GoalId, GoalProgress, GoalProgressFilter, GoalProgressUpdate, GoalUpdate,
    NewGoal, NewGoalProgress, RecordId, RecordKind,
};
use vita_storage::{ProgressDraft, RecordAccess};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::jobs::JobQueue;
use crate::routes::generic;
use crate::state::AppState;
use crate::types::{GoalPageQuery, Pagination, RecordPageQuery};
use crate::validation::{resolve_pagination, ValidateNonEmpty};
use vita_core::UserId;

/// Resolve a goal in the caller's ownership scope or 404.
async fn owned_goal(records: &RecordAccess, user_id: UserId, goal_id: GoalId) -> ApiResult<Goal> {
    records
        .get::<Goal>(user_id, goal_id)
        .await?
        .ok_or_else(|| ApiError::goal_not_found(goal_id))
}

// ============================================================================
// GOALS
// ============================================================================

/// GET /api/v1/records/goals - List goals
#[utoipa::path(
    get,
    path = "/api/v1/records/goals",
    tag = "Goals",
    params(GoalPageQuery),
    responses(
        (status = 200, description = "One page of goals"),
        (status = 400, description = "Invalid pagination", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_goals(
    State(records): State<RecordAccess>,
    AuthUser(user_id): AuthUser,
    Query(query): Query<GoalPageQuery>,
) -> ApiResult<Json<Pagination<Goal>>> {
    let (limit, offset) = resolve_pagination(query.limit, query.offset)?;
    let filter = GoalFilter {
        is_active: query.is_active,
    };
    generic::list_handler::<Goal>(&records, user_id, &filter, limit, offset).await
}

/// POST /api/v1/records/goals - Create a goal
#[utoipa::path(
    post,
    path = "/api/v1/records/goals",
    tag = "Goals",
    request_body = NewGoal,
    responses(
        (status = 201, description = "Goal created", body = Goal),
        (status = 400, description = "Missing title", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_goal(
    State(records): State<RecordAccess>,
    AuthUser(user_id): AuthUser,
    Json(req): Json<NewGoal>,
) -> ApiResult<(StatusCode, Json<Goal>)> {
    req.title.validate_non_empty("title")?;
    generic::create_handler::<Goal>(&records, user_id, &req).await
}

/// GET /api/v1/records/goals/{goal_id} - Get a goal
#[utoipa::path(
    get,
    path = "/api/v1/records/goals/{goal_id}",
    tag = "Goals",
    params(("goal_id" = i64, Path, description = "Goal id")),
    responses(
        (status = 200, description = "Goal", body = Goal),
        (status = 404, description = "Not found", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_goal(
    State(records): State<RecordAccess>,
    AuthUser(user_id): AuthUser,
    Path(goal_id): Path<GoalId>,
) -> ApiResult<Json<Goal>> {
    generic::get_handler::<Goal>(&records, user_id, goal_id).await
}

/// PATCH /api/v1/records/goals/{goal_id} - Update a goal
#[utoipa::path(
    patch,
    path = "/api/v1/records/goals/{goal_id}",
    tag = "Goals",
    params(("goal_id" = i64, Path, description = "Goal id")),
    request_body = GoalUpdate,
    responses(
        (status = 200, description = "Updated goal", body = Goal),
        (status = 404, description = "Not found", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_goal(
    State(records): State<RecordAccess>,
    AuthUser(user_id): AuthUser,
    Path(goal_id): Path<GoalId>,
    Json(req): Json<GoalUpdate>,
) -> ApiResult<Json<Goal>> {
    if let Some(title) = &req.title {
        title.validate_non_empty("title")?;
    }
    generic::update_handler::<Goal>(&records, user_id, goal_id, &req).await
}

/// DELETE /api/v1/records/goals/{goal_id} - Delete a goal and its progress
#[utoipa::path(
    delete,
    path = "/api/v1/records/goals/{goal_id}",
    tag = "Goals",
    params(("goal_id" = i64, Path, description = "Goal id")),
    responses(
        (status = 204, description = "Deleted, progress entries included"),
        (status = 404, description = "Not found", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_goal(
    State(records): State<RecordAccess>,
    AuthUser(user_id): AuthUser,
    Path(goal_id): Path<GoalId>,
) -> ApiResult<StatusCode> {
    generic::delete_handler::<Goal>(&records, user_id, goal_id).await
}

// ============================================================================
// GOAL PROGRESS
// ============================================================================

/// GET /api/v1/records/goals/{goal_id}/progress - List progress for a goal
#[utoipa::path(
    get,
    path = "/api/v1/records/goals/{goal_id}/progress",
    tag = "Goal Progress",
    params(("goal_id" = i64, Path, description = "Goal id"), RecordPageQuery),
    responses(
        (status = 200, description = "One page of progress entries"),
        (status = 404, description = "Goal not found", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_goal_progress(
    State(records): State<RecordAccess>,
    AuthUser(user_id): AuthUser,
    Path(goal_id): Path<GoalId>,
    Query(query): Query<RecordPageQuery>,
) -> ApiResult<Json<Pagination<GoalProgress>>> {
    owned_goal(&records, user_id, goal_id).await?;
    let (limit, offset) = resolve_pagination(query.limit, query.offset)?;
    let filter = GoalProgressFilter {
        goal_id,
        date_from: query.date_from,
        date_to: query.date_to,
    };
    generic::list_handler::<GoalProgress>(&records, user_id, &filter, limit, offset).await
}

/// POST /api/v1/records/goals/{goal_id}/progress - Create a progress entry
#[utoipa::path(
    post,
    path = "/api/v1/records/goals/{goal_id}/progress",
    tag = "Goal Progress",
    params(("goal_id" = i64, Path, description = "Goal id")),
    request_body = NewGoalProgress,
    responses(
        (status = 201, description = "Progress entry created", body = GoalProgress),
        (status = 404, description = "Goal not found", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_goal_progress(
    State(records): State<RecordAccess>,
    State(jobs): State<JobQueue>,
    AuthUser(user_id): AuthUser,
    Path(goal_id): Path<GoalId>,
    Json(req): Json<NewGoalProgress>,
) -> ApiResult<(StatusCode, Json<GoalProgress>)> {
    owned_goal(&records, user_id, goal_id).await?;
    let draft = ProgressDraft {
        goal_id,
        fields: req,
    };
    let response = generic::create_handler::<GoalProgress>(&records, user_id, &draft).await?;
    jobs.enqueue_recompute(user_id);
    Ok(response)
}

/// GET /api/v1/records/goals/{goal_id}/progress/{progress_id} - Get one entry
#[utoipa::path(
    get,
    path = "/api/v1/records/goals/{goal_id}/progress/{progress_id}",
    tag = "Goal Progress",
    params(
        ("goal_id" = i64, Path, description = "Goal id"),
        ("progress_id" = i64, Path, description = "Progress id"),
    ),
    responses(
        (status = 200, description = "Progress entry", body = GoalProgress),
        (status = 404, description = "Not found", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_goal_progress(
    State(records): State<RecordAccess>,
    AuthUser(user_id): AuthUser,
    Path((goal_id, progress_id)): Path<(GoalId, RecordId)>,
) -> ApiResult<Json<GoalProgress>> {
    owned_goal(&records, user_id, goal_id).await?;
    let progress = records
        .get::<GoalProgress>(user_id, progress_id)
        .await?
        // An entry under a different goal is absent from this path's view.
        .filter(|p| p.goal_id == goal_id)
        .ok_or_else(|| ApiError::record_not_found(RecordKind::GoalProgress, progress_id))?;
    Ok(Json(progress))
}

/// PATCH /api/v1/records/goals/{goal_id}/progress/{progress_id} - Update one entry
#[utoipa::path(
    patch,
    path = "/api/v1/records/goals/{goal_id}/progress/{progress_id}",
    tag = "Goal Progress",
    params(
        ("goal_id" = i64, Path, description = "Goal id"),
        ("progress_id" = i64, Path, description = "Progress id"),
    ),
    request_body = GoalProgressUpdate,
    responses(
        (status = 200, description = "Updated progress entry", body = GoalProgress),
        (status = 404, description = "Not found", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_goal_progress(
    State(records): State<RecordAccess>,
    AuthUser(user_id): AuthUser,
    Path((goal_id, progress_id)): Path<(GoalId, RecordId)>,
    Json(req): Json<GoalProgressUpdate>,
) -> ApiResult<Json<GoalProgress>> {
    owned_goal(&records, user_id, goal_id).await?;
    let current = records.get::<GoalProgress>(user_id, progress_id).await?;
    if current.map_or(true, |p| p.goal_id != goal_id) {
        return Err(ApiError::record_not_found(
            RecordKind::GoalProgress,
            progress_id,
        ));
    }
    generic::update_handler::<GoalProgress>(&records, user_id, progress_id, &req).await
}

/// DELETE /api/v1/records/goals/{goal_id}/progress/{progress_id} - Delete one entry
#[utoipa::path(
    delete,
    path = "/api/v1/records/goals/{goal_id}/progress/{progress_id}",
    tag = "Goal Progress",
    params(
        ("goal_id" = i64, Path, description = "Goal id"),
        ("progress_id" = i64, Path, description = "Progress id"),
    ),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_goal_progress(
    State(records): State<RecordAccess>,
    AuthUser(user_id): AuthUser,
    Path((goal_id, progress_id)): Path<(GoalId, RecordId)>,
) -> ApiResult<StatusCode> {
    owned_goal(&records, user_id, goal_id).await?;
    let current = records.get::<GoalProgress>(user_id, progress_id).await?;
    if current.map_or(true, |p| p.goal_id != goal_id) {
        return Err(ApiError::record_not_found(
            RecordKind::GoalProgress,
            progress_id,
        ));
    }
    generic::delete_handler::<GoalProgress>(&records, user_id, progress_id).await
}

/// Create the goal routes router, progress nested underneath.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_goals).post(create_goal))
        .route(
            "/:goal_id",
            get(get_goal).patch(update_goal).delete(delete_goal),
        )
        .route(
            "/:goal_id/progress",
            get(list_goal_progress).post(create_goal_progress),
        )
        .route(
            "/:goal_id/progress/:progress_id",
            get(get_goal_progress)
                .patch(update_goal_progress)
                .delete(delete_goal_progress),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::jobs::StatsJob;
    use vita_test_utils::{date, new_goal, new_progress, store_with_user};

    async fn setup() -> (RecordAccess, JobQueue, crate::jobs::stats_jobs::JobReceiver, i64, i64) {
        let (store, user) = store_with_user().await;
        let stranger = store.add_user("stranger@example.com");
        let records = RecordAccess::new(store);
        let (jobs, rx) = JobQueue::new(8);
        (records, jobs, rx, user.id, stranger.id)
    }

    #[tokio::test]
    async fn test_progress_create_triggers_recompute_and_nested_404s() {
        let (records, jobs, mut rx, user_id, stranger_id) = setup().await;

        let (_, Json(goal)) = create_goal(
            State(records.clone()),
            AuthUser(user_id),
            Json(new_goal("Run 5k")),
        )
        .await
        .unwrap();

        let (status, Json(progress)) = create_goal_progress(
            State(records.clone()),
            State(jobs.clone()),
            AuthUser(user_id),
            Path(goal.id),
            Json(new_progress(date("2026-08-01"), true)),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(progress.goal_id, goal.id);

        let (_, job) = rx.try_recv_job().expect("recompute enqueued");
        assert!(matches!(job, StatsJob::ComputeOne { user_id: uid, .. } if uid == user_id));

        // A stranger addressing the same goal sees GoalNotFound, identical
        // to a nonexistent goal id.
        let err = create_goal_progress(
            State(records.clone()),
            State(jobs),
            AuthUser(stranger_id),
            Path(goal.id),
            Json(new_progress(date("2026-08-01"), false)),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::GoalNotFound);
    }

    #[tokio::test]
    async fn test_progress_id_scoped_to_goal_path() {
        let (records, jobs, _rx, user_id, _) = setup().await;

        let (_, Json(goal_a)) = create_goal(
            State(records.clone()),
            AuthUser(user_id),
            Json(new_goal("a")),
        )
        .await
        .unwrap();
        let (_, Json(goal_b)) = create_goal(
            State(records.clone()),
            AuthUser(user_id),
            Json(new_goal("b")),
        )
        .await
        .unwrap();

        let (_, Json(progress)) = create_goal_progress(
            State(records.clone()),
            State(jobs),
            AuthUser(user_id),
            Path(goal_a.id),
            Json(new_progress(date("2026-08-01"), false)),
        )
        .await
        .unwrap();

        // Addressing goal A's entry through goal B's path is a 404.
        let err = get_goal_progress(
            State(records.clone()),
            AuthUser(user_id),
            Path((goal_b.id, progress.id)),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::GoalProgressNotFound);

        let ok = get_goal_progress(
            State(records),
            AuthUser(user_id),
            Path((goal_a.id, progress.id)),
        )
        .await;
        assert!(ok.is_ok());
    }

    #[tokio::test]
    async fn test_goal_create_does_not_trigger_recompute() {
        let (records, _jobs, mut rx, user_id, _) = setup().await;
        create_goal(State(records), AuthUser(user_id), Json(new_goal("g")))
            .await
            .unwrap();
        assert!(rx.try_recv_job().is_none());
    }
}
