//! Body record REST API routes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use vita_core::{BodyRecord, BodyRecordUpdate, DateRangeFilter, NewBodyRecord, RecordId};
use vita_storage::RecordAccess;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::jobs::JobQueue;
use crate::routes::generic;
use crate::state::AppState;
use crate::types::{Pagination, RecordPageQuery};
use crate::validation::resolve_pagination;

/// GET /api/v1/records/body-records - List body records
#[utoipa::path(
    get,
    path = "/api/v1/records/body-records",
    tag = "Body Records",
    params(RecordPageQuery),
    responses(
        (status = 200, description = "One page of body records"),
        (status = 400, description = "Invalid pagination or date filter", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_body_records(
    State(records): State<RecordAccess>,
    AuthUser(user_id): AuthUser,
    Query(query): Query<RecordPageQuery>,
) -> ApiResult<Json<Pagination<BodyRecord>>> {
    let (limit, offset) = resolve_pagination(query.limit, query.offset)?;
    let filter = DateRangeFilter::new(query.date_from, query.date_to);
    generic::list_handler::<BodyRecord>(&records, user_id, &filter, limit, offset).await
}

/// POST /api/v1/records/body-records - Create a body record
#[utoipa::path(
    post,
    path = "/api/v1/records/body-records",
    tag = "Body Records",
    request_body = NewBodyRecord,
    responses(
        (status = 201, description = "Body record created", body = BodyRecord),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_body_record(
    State(records): State<RecordAccess>,
    State(jobs): State<JobQueue>,
    AuthUser(user_id): AuthUser,
    Json(req): Json<NewBodyRecord>,
) -> ApiResult<(StatusCode, Json<BodyRecord>)> {
    let response = generic::create_handler::<BodyRecord>(&records, user_id, &req).await?;
    jobs.enqueue_recompute(user_id);
    Ok(response)
}

/// GET /api/v1/records/body-records/{id} - Get a body record
#[utoipa::path(
    get,
    path = "/api/v1/records/body-records/{id}",
    tag = "Body Records",
    params(("id" = i64, Path, description = "Body record id")),
    responses(
        (status = 200, description = "Body record", body = BodyRecord),
        (status = 404, description = "Not found", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_body_record(
    State(records): State<RecordAccess>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<RecordId>,
) -> ApiResult<Json<BodyRecord>> {
    generic::get_handler::<BodyRecord>(&records, user_id, id).await
}

/// PATCH /api/v1/records/body-records/{id} - Update a body record
#[utoipa::path(
    patch,
    path = "/api/v1/records/body-records/{id}",
    tag = "Body Records",
    params(("id" = i64, Path, description = "Body record id")),
    request_body = BodyRecordUpdate,
    responses(
        (status = 200, description = "Updated body record", body = BodyRecord),
        (status = 404, description = "Not found", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_body_record(
    State(records): State<RecordAccess>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<RecordId>,
    Json(req): Json<BodyRecordUpdate>,
) -> ApiResult<Json<BodyRecord>> {
    generic::update_handler::<BodyRecord>(&records, user_id, id, &req).await
}

/// DELETE /api/v1/records/body-records/{id} - Delete a body record
#[utoipa::path(
    delete,
    path = "/api/v1/records/body-records/{id}",
    tag = "Body Records",
    params(("id" = i64, Path, description = "Body record id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_body_record(
    State(records): State<RecordAccess>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<RecordId>,
) -> ApiResult<StatusCode> {
    generic::delete_handler::<BodyRecord>(&records, user_id, id).await
}

/// Create the body-record routes router.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_body_records).post(create_body_record))
        .route(
            "/:id",
            get(get_body_record)
                .patch(update_body_record)
                .delete(delete_body_record),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::jobs::StatsJob;
    use vita_test_utils::{date, new_body_record, store_with_user};

    #[tokio::test]
    async fn test_create_schedules_recompute_for_owner() {
        let (store, user) = store_with_user().await;
        let records = RecordAccess::new(store);
        let (jobs, mut rx) = JobQueue::new(8);

        let (status, Json(record)) = create_body_record(
            State(records),
            State(jobs),
            AuthUser(user.id),
            Json(new_body_record(date("2026-08-01"), 70.5)),
        )
        .await
        .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(record.user_id, user.id);

        // Observable on the queue, independent of store state.
        let (_, job) = rx.try_recv_job().expect("recompute enqueued");
        assert_eq!(
            job,
            StatsJob::ComputeOne {
                user_id: user.id,
                window_days: 30
            }
        );
    }

    #[tokio::test]
    async fn test_patch_keeps_omitted_fields() {
        let (store, user) = store_with_user().await;
        let records = RecordAccess::new(store);
        let (jobs, _rx) = JobQueue::new(8);

        let (_, Json(created)) = create_body_record(
            State(records.clone()),
            State(jobs),
            AuthUser(user.id),
            Json(vita_core::NewBodyRecord {
                date: date("2026-08-01"),
                weight: 70.5,
                body_fat_percentage: Some(18.2),
            }),
        )
        .await
        .unwrap();

        let Json(updated) = update_body_record(
            State(records),
            AuthUser(user.id),
            Path(created.id),
            Json(BodyRecordUpdate {
                weight: Some(69.9),
                ..Default::default()
            }),
        )
        .await
        .unwrap();

        assert_eq!(updated.weight, 69.9);
        assert_eq!(updated.body_fat_percentage, Some(18.2));
    }

    #[tokio::test]
    async fn test_list_rejects_out_of_range_limit() {
        let (store, user) = store_with_user().await;
        let records = RecordAccess::new(store);

        let err = list_body_records(
            State(records),
            AuthUser(user.id),
            Query(RecordPageQuery {
                limit: Some(500),
                ..Default::default()
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidRange);
    }
}
