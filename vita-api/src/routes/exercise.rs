//! Exercise REST API routes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use vita_core::{DateRangeFilter, Exercise, ExerciseUpdate, NewExercise, RecordId};
use vita_storage::RecordAccess;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::jobs::JobQueue;
use crate::routes::generic;
use crate::state::AppState;
use crate::types::{Pagination, RecordPageQuery};
use crate::validation::{resolve_pagination, ValidateNonEmpty};

/// GET /api/v1/records/exercises - List exercises
#[utoipa::path(
    get,
    path = "/api/v1/records/exercises",
    tag = "Exercises",
    params(RecordPageQuery),
    responses(
        (status = 200, description = "One page of exercises"),
        (status = 400, description = "Invalid pagination or date filter", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_exercises(
    State(records): State<RecordAccess>,
    AuthUser(user_id): AuthUser,
    Query(query): Query<RecordPageQuery>,
) -> ApiResult<Json<Pagination<Exercise>>> {
    let (limit, offset) = resolve_pagination(query.limit, query.offset)?;
    let filter = DateRangeFilter::new(query.date_from, query.date_to);
    generic::list_handler::<Exercise>(&records, user_id, &filter, limit, offset).await
}

/// POST /api/v1/records/exercises - Create an exercise
#[utoipa::path(
    post,
    path = "/api/v1/records/exercises",
    tag = "Exercises",
    request_body = NewExercise,
    responses(
        (status = 201, description = "Exercise created", body = Exercise),
        (status = 400, description = "Missing name", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_exercise(
    State(records): State<RecordAccess>,
    State(jobs): State<JobQueue>,
    AuthUser(user_id): AuthUser,
    Json(req): Json<NewExercise>,
) -> ApiResult<(StatusCode, Json<Exercise>)> {
    req.name.validate_non_empty("name")?;
    let response = generic::create_handler::<Exercise>(&records, user_id, &req).await?;
    jobs.enqueue_recompute(user_id);
    Ok(response)
}

/// GET /api/v1/records/exercises/{id} - Get an exercise
#[utoipa::path(
    get,
    path = "/api/v1/records/exercises/{id}",
    tag = "Exercises",
    params(("id" = i64, Path, description = "Exercise id")),
    responses(
        (status = 200, description = "Exercise", body = Exercise),
        (status = 404, description = "Not found", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_exercise(
    State(records): State<RecordAccess>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<RecordId>,
) -> ApiResult<Json<Exercise>> {
    generic::get_handler::<Exercise>(&records, user_id, id).await
}

/// PATCH /api/v1/records/exercises/{id} - Update an exercise
#[utoipa::path(
    patch,
    path = "/api/v1/records/exercises/{id}",
    tag = "Exercises",
    params(("id" = i64, Path, description = "Exercise id")),
    request_body = ExerciseUpdate,
    responses(
        (status = 200, description = "Updated exercise", body = Exercise),
        (status = 404, description = "Not found", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_exercise(
    State(records): State<RecordAccess>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<RecordId>,
    Json(req): Json<ExerciseUpdate>,
) -> ApiResult<Json<Exercise>> {
    if let Some(name) = &req.name {
        name.validate_non_empty("name")?;
    }
    generic::update_handler::<Exercise>(&records, user_id, id, &req).await
}

/// DELETE /api/v1/records/exercises/{id} - Delete an exercise
#[utoipa::path(
    delete,
    path = "/api/v1/records/exercises/{id}",
    tag = "Exercises",
    params(("id" = i64, Path, description = "Exercise id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_exercise(
    State(records): State<RecordAccess>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<RecordId>,
) -> ApiResult<StatusCode> {
    generic::delete_handler::<Exercise>(&records, user_id, id).await
}

/// Create the exercise routes router.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_exercises).post(create_exercise))
        .route(
            "/:id",
            get(get_exercise)
                .patch(update_exercise)
                .delete(delete_exercise),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use vita_test_utils::{date, store_with_user};

    #[tokio::test]
    async fn test_create_rejects_blank_name() {
        let (store, user) = store_with_user().await;
        let records = RecordAccess::new(store);
        let (jobs, mut rx) = JobQueue::new(8);

        let err = create_exercise(
            State(records),
            State(jobs),
            AuthUser(user.id),
            Json(NewExercise {
                date: date("2026-08-01"),
                name: "  ".to_string(),
                duration_min: 30,
                calories: None,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingField);
        // Nothing was scheduled for a rejected write.
        assert!(rx.try_recv_job().is_none());
    }
}
