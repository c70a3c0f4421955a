//! Meal REST API routes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use vita_core::{Meal, MealFilter, MealUpdate, NewMeal, RecordId};
use vita_storage::RecordAccess;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::jobs::JobQueue;
use crate::routes::generic;
use crate::state::AppState;
use crate::types::{MealPageQuery, Pagination};
use crate::validation::resolve_pagination;

/// GET /api/v1/records/meals - List meals
#[utoipa::path(
    get,
    path = "/api/v1/records/meals",
    tag = "Meals",
    params(MealPageQuery),
    responses(
        (status = 200, description = "One page of meals"),
        (status = 400, description = "Invalid pagination or filter", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_meals(
    State(records): State<RecordAccess>,
    AuthUser(user_id): AuthUser,
    Query(query): Query<MealPageQuery>,
) -> ApiResult<Json<Pagination<Meal>>> {
    let (limit, offset) = resolve_pagination(query.limit, query.offset)?;
    let filter = MealFilter {
        date_from: query.date_from,
        date_to: query.date_to,
        meal_type: query.meal_type,
    };
    generic::list_handler::<Meal>(&records, user_id, &filter, limit, offset).await
}

/// POST /api/v1/records/meals - Create a meal
#[utoipa::path(
    post,
    path = "/api/v1/records/meals",
    tag = "Meals",
    request_body = NewMeal,
    responses(
        (status = 201, description = "Meal created", body = Meal),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_meal(
    State(records): State<RecordAccess>,
    State(jobs): State<JobQueue>,
    AuthUser(user_id): AuthUser,
    Json(req): Json<NewMeal>,
) -> ApiResult<(StatusCode, Json<Meal>)> {
    let response = generic::create_handler::<Meal>(&records, user_id, &req).await?;
    jobs.enqueue_recompute(user_id);
    Ok(response)
}

/// GET /api/v1/records/meals/{id} - Get a meal
#[utoipa::path(
    get,
    path = "/api/v1/records/meals/{id}",
    tag = "Meals",
    params(("id" = i64, Path, description = "Meal id")),
    responses(
        (status = 200, description = "Meal", body = Meal),
        (status = 404, description = "Not found", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_meal(
    State(records): State<RecordAccess>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<RecordId>,
) -> ApiResult<Json<Meal>> {
    generic::get_handler::<Meal>(&records, user_id, id).await
}

/// PATCH /api/v1/records/meals/{id} - Update a meal
#[utoipa::path(
    patch,
    path = "/api/v1/records/meals/{id}",
    tag = "Meals",
    params(("id" = i64, Path, description = "Meal id")),
    request_body = MealUpdate,
    responses(
        (status = 200, description = "Updated meal", body = Meal),
        (status = 404, description = "Not found", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_meal(
    State(records): State<RecordAccess>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<RecordId>,
    Json(req): Json<MealUpdate>,
) -> ApiResult<Json<Meal>> {
    generic::update_handler::<Meal>(&records, user_id, id, &req).await
}

/// DELETE /api/v1/records/meals/{id} - Delete a meal
#[utoipa::path(
    delete,
    path = "/api/v1/records/meals/{id}",
    tag = "Meals",
    params(("id" = i64, Path, description = "Meal id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found", body = ApiError),
        (status = 401, description = "Unauthorized", body = ApiError),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_meal(
    State(records): State<RecordAccess>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<RecordId>,
) -> ApiResult<StatusCode> {
    generic::delete_handler::<Meal>(&records, user_id, id).await
}

/// Create the meal routes router.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_meals).post(create_meal))
        .route(
            "/:id",
            get(get_meal).patch(update_meal).delete(delete_meal),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::StatsJob;
    use vita_core::MealType;
    use vita_test_utils::{date, new_meal, store_with_user};

    #[tokio::test]
    async fn test_create_meal_schedules_recompute() {
        let (store, user) = store_with_user().await;
        let records = RecordAccess::new(store);
        let (jobs, mut rx) = JobQueue::new(8);

        let (status, _) = create_meal(
            State(records),
            State(jobs),
            AuthUser(user.id),
            Json(new_meal(date("2026-08-01"), MealType::Lunch)),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);

        let (_, job) = rx.try_recv_job().expect("recompute enqueued");
        assert!(matches!(job, StatsJob::ComputeOne { user_id, .. } if user_id == user.id));
    }

    #[tokio::test]
    async fn test_list_meals_filters_by_type() {
        let (store, user) = store_with_user().await;
        let records = RecordAccess::new(store);
        let (jobs, _rx) = JobQueue::new(8);

        for meal_type in [MealType::Morning, MealType::Dinner, MealType::Dinner] {
            create_meal(
                State(records.clone()),
                State(jobs.clone()),
                AuthUser(user.id),
                Json(new_meal(date("2026-08-01"), meal_type)),
            )
            .await
            .unwrap();
        }

        let Json(page) = list_meals(
            State(records),
            AuthUser(user.id),
            Query(MealPageQuery {
                meal_type: Some(MealType::Dinner),
                ..Default::default()
            }),
        )
        .await
        .unwrap();
        assert_eq!(page.count, 2);
        assert!(page.data.iter().all(|m| m.meal_type == MealType::Dinner));
    }
}
