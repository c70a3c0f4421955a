//! Diary REST API routes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use vita_core::{DateRangeFilter, Diary, DiaryUpdate, NewDiary, RecordId};
use vita_storage::RecordAccess;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::jobs::JobQueue;
use crate::routes::generic;
use crate::state::AppState;
use crate::types::{Pagination, RecordPageQuery};
use crate::validation::{resolve_pagination, ValidateNonEmpty};

/// GET /api/v1/records/diaries - List diary entries
#[utoipa::path(
    get,
    path = "/api/v1/records/diaries",
    tag = "Diaries",
    params(RecordPageQuery),
    responses(
        (status = 200, description = "One page of diary entries"),
        (status = 400, description = "Invalid pagination or date filter", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_diaries(
    State(records): State<RecordAccess>,
    AuthUser(user_id): AuthUser,
    Query(query): Query<RecordPageQuery>,
) -> ApiResult<Json<Pagination<Diary>>> {
    let (limit, offset) = resolve_pagination(query.limit, query.offset)?;
    let filter = DateRangeFilter::new(query.date_from, query.date_to);
    generic::list_handler::<Diary>(&records, user_id, &filter, limit, offset).await
}

/// POST /api/v1/records/diaries - Create a diary entry
#[utoipa::path(
    post,
    path = "/api/v1/records/diaries",
    tag = "Diaries",
    request_body = NewDiary,
    responses(
        (status = 201, description = "Diary entry created", body = Diary),
        (status = 400, description = "Missing content", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_diary(
    State(records): State<RecordAccess>,
    State(jobs): State<JobQueue>,
    AuthUser(user_id): AuthUser,
    Json(req): Json<NewDiary>,
) -> ApiResult<(StatusCode, Json<Diary>)> {
    req.content.validate_non_empty("content")?;
    let response = generic::create_handler::<Diary>(&records, user_id, &req).await?;
    jobs.enqueue_recompute(user_id);
    Ok(response)
}

/// GET /api/v1/records/diaries/{id} - Get a diary entry
#[utoipa::path(
    get,
    path = "/api/v1/records/diaries/{id}",
    tag = "Diaries",
    params(("id" = i64, Path, description = "Diary id")),
    responses(
        (status = 200, description = "Diary entry", body = Diary),
        (status = 404, description = "Not found", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_diary(
    State(records): State<RecordAccess>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<RecordId>,
) -> ApiResult<Json<Diary>> {
    generic::get_handler::<Diary>(&records, user_id, id).await
}

/// PATCH /api/v1/records/diaries/{id} - Update a diary entry
#[utoipa::path(
    patch,
    path = "/api/v1/records/diaries/{id}",
    tag = "Diaries",
    params(("id" = i64, Path, description = "Diary id")),
    request_body = DiaryUpdate,
    responses(
        (status = 200, description = "Updated diary entry", body = Diary),
        (status = 404, description = "Not found", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_diary(
    State(records): State<RecordAccess>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<RecordId>,
    Json(req): Json<DiaryUpdate>,
) -> ApiResult<Json<Diary>> {
    if let Some(content) = &req.content {
        content.validate_non_empty("content")?;
    }
    generic::update_handler::<Diary>(&records, user_id, id, &req).await
}

/// DELETE /api/v1/records/diaries/{id} - Delete a diary entry
#[utoipa::path(
    delete,
    path = "/api/v1/records/diaries/{id}",
    tag = "Diaries",
    params(("id" = i64, Path, description = "Diary id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_diary(
    State(records): State<RecordAccess>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<RecordId>,
) -> ApiResult<StatusCode> {
    generic::delete_handler::<Diary>(&records, user_id, id).await
}

/// Create the diary routes router.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_diaries).post(create_diary))
        .route(
            "/:id",
            get(get_diary).patch(update_diary).delete(delete_diary),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use vita_test_utils::{date, new_diary, store_with_user};

    #[tokio::test]
    async fn test_foreign_diary_reads_as_missing() {
        let (store, user) = store_with_user().await;
        let stranger = store.add_user("stranger@example.com");
        let records = RecordAccess::new(store);
        let (jobs, _rx) = JobQueue::new(8);

        let (_, Json(diary)) = create_diary(
            State(records.clone()),
            State(jobs),
            AuthUser(user.id),
            Json(new_diary(date("2026-08-01"), "slept well")),
        )
        .await
        .unwrap();

        let err = get_diary(State(records), AuthUser(stranger.id), Path(diary.id))
            .await
            .unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::DiaryNotFound);
    }
}
