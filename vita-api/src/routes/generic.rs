//! Generic CRUD handler helpers over `OwnedRecord` kinds.
//!
//! Per-kind route files stay thin: they parse their kind's query/path
//! shapes, then delegate to these helpers. Ownership failures arrive from
//! the access layer as `None`/`false` and are mapped to the kind's
//! not-found error here, so every kind rejects foreign ids identically.

use axum::{http::StatusCode, Json};
use serde::Serialize;

use vita_core::{RecordId, UserId};
use vita_storage::{OwnedRecord, RecordAccess};

use crate::error::{ApiError, ApiResult};
use crate::types::Pagination;

/// Generic list handler - one page of the owner's records.
pub async fn list_handler<K>(
    records: &RecordAccess,
    user_id: UserId,
    filter: &K::Filter,
    limit: i64,
    offset: i64,
) -> ApiResult<Json<Pagination<K>>>
where
    K: OwnedRecord + Serialize,
{
    let page = records
        .list::<K>(user_id, filter, Some(limit), offset)
        .await?;
    Ok(Json(page.into()))
}

/// Generic create handler - creates a record and returns 201.
pub async fn create_handler<K>(
    records: &RecordAccess,
    user_id: UserId,
    fields: &K::Create,
) -> ApiResult<(StatusCode, Json<K>)>
where
    K: OwnedRecord + Serialize,
{
    let record = records.create::<K>(user_id, fields).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// Generic get handler - retrieves a record by id.
pub async fn get_handler<K>(
    records: &RecordAccess,
    user_id: UserId,
    id: RecordId,
) -> ApiResult<Json<K>>
where
    K: OwnedRecord + Serialize,
{
    let record = records
        .get::<K>(user_id, id)
        .await?
        .ok_or_else(|| ApiError::record_not_found(K::KIND, id))?;
    Ok(Json(record))
}

/// Generic update handler - applies a partial update.
pub async fn update_handler<K>(
    records: &RecordAccess,
    user_id: UserId,
    id: RecordId,
    update: &K::Update,
) -> ApiResult<Json<K>>
where
    K: OwnedRecord + Serialize,
{
    let record = records
        .update::<K>(user_id, id, update)
        .await?
        .ok_or_else(|| ApiError::record_not_found(K::KIND, id))?;
    Ok(Json(record))
}

/// Generic delete handler - deletes a record, returning 204.
pub async fn delete_handler<K>(
    records: &RecordAccess,
    user_id: UserId,
    id: RecordId,
) -> ApiResult<StatusCode>
where
    K: OwnedRecord + Serialize,
{
    if !records.delete::<K>(user_id, id).await? {
        return Err(ApiError::record_not_found(K::KIND, id));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use std::sync::Arc;
    use vita_core::{BodyRecord, DateRangeFilter};
    use vita_storage::Store;
    use vita_test_utils::{date, new_body_record, store_with_user};

    #[tokio::test]
    async fn test_get_handler_maps_none_to_kind_not_found() {
        let (store, user) = store_with_user().await;
        let records = RecordAccess::new(store);

        let err = get_handler::<BodyRecord>(&records, user.id, 9)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::BodyRecordNotFound);
    }

    #[tokio::test]
    async fn test_delete_handler_404_then_204() {
        let (store, user) = store_with_user().await;
        let records = RecordAccess::new(Arc::clone(&store) as Arc<dyn vita_storage::Store>);
        let record = store
            .body_record_insert(user.id, &new_body_record(date("2026-08-01"), 70.0))
            .await
            .unwrap();

        let status = delete_handler::<BodyRecord>(&records, user.id, record.id)
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        let err = delete_handler::<BodyRecord>(&records, user.id, record.id)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::BodyRecordNotFound);
    }

    #[tokio::test]
    async fn test_list_handler_wraps_page() {
        let (store, user) = store_with_user().await;
        let records = RecordAccess::new(Arc::clone(&store) as Arc<dyn vita_storage::Store>);
        for day in 1..=3 {
            store
                .body_record_insert(
                    user.id,
                    &new_body_record(date(&format!("2026-08-0{}", day)), 70.0),
                )
                .await
                .unwrap();
        }

        let Json(page) =
            list_handler::<BodyRecord>(&records, user.id, &DateRangeFilter::default(), 2, 0)
                .await
                .unwrap();
        assert_eq!(page.data.len(), 2);
        assert_eq!(page.count, 3);
        assert_eq!(page.next, "?limit=2&offset=2");
    }
}
