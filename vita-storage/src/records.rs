//! Generic ownership-scoped record access.
//!
//! Each record kind implements the `OwnedRecord` descriptor (field shapes,
//! filter set, mapping onto the `Store` methods), and `RecordAccess`
//! provides the uniform list/create/get/update/delete contract on top. One
//! generic component serves all six kinds.
//!
//! Ownership is enforced here, not trusted from input: every read and write
//! resolves the record's owner (directly via `user_id`, or transitively
//! through the parent goal for progress entries) and collapses a mismatch
//! into "not found". A caller can never distinguish another user's record
//! from an absent one.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use vita_core::{
    BodyRecord, BodyRecordUpdate, DateRangeFilter, Diary, DiaryUpdate, Exercise, ExerciseUpdate,
    Goal, GoalFilter, GoalId, GoalProgress, GoalProgressFilter, GoalProgressUpdate, GoalUpdate,
    Meal, MealFilter, MealUpdate, NewBodyRecord, NewDiary, NewExercise, NewGoal, NewGoalProgress,
    NewMeal, RecordId, RecordKind, StorageError, UserId, VitaResult,
};

use crate::Store;

// ============================================================================
// OWNED RECORD TRAIT
// ============================================================================

/// Kind descriptor for records that support the generic access contract.
///
/// Implementations adapt the generic operations onto the concrete `Store`
/// methods for their kind. The associated types define the create payload,
/// the partial-update payload, and the kind-specific filter set.
#[async_trait]
pub trait OwnedRecord: Clone + Send + Sync + Serialize + 'static {
    /// Create payload (owner supplied separately).
    type Create: Send + Sync;
    /// Partial-update payload; absent fields are left untouched.
    type Update: Send + Sync;
    /// Kind-specific list filter.
    type Filter: Clone + Default + Send + Sync;

    const KIND: RecordKind;

    fn id(&self) -> RecordId;

    /// Resolve the owning user of an already-fetched record. `None` when
    /// the owner cannot be resolved (e.g. the parent goal is gone).
    async fn owner(store: &dyn Store, record: &Self) -> VitaResult<Option<UserId>>;

    async fn insert(store: &dyn Store, owner: UserId, fields: &Self::Create) -> VitaResult<Self>;
    async fn fetch(store: &dyn Store, id: RecordId) -> VitaResult<Option<Self>>;
    async fn persist_update(
        store: &dyn Store,
        id: RecordId,
        update: &Self::Update,
    ) -> VitaResult<Self>;
    async fn remove(store: &dyn Store, id: RecordId) -> VitaResult<()>;
    async fn page(
        store: &dyn Store,
        owner: UserId,
        filter: &Self::Filter,
        limit: Option<i64>,
        offset: i64,
    ) -> VitaResult<Vec<Self>>;
    async fn count(store: &dyn Store, owner: UserId, filter: &Self::Filter) -> VitaResult<i64>;
}

// ============================================================================
// PAGINATION
// ============================================================================

/// One page of records plus the total match count and relative cursors.
///
/// Cursors are query-string fragments (`"?limit=10&offset=20"`), empty when
/// there is no adjacent page or when no limit was applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<K> {
    pub items: Vec<K>,
    pub total: i64,
    pub previous: String,
    pub next: String,
}

fn page_cursors(limit: Option<i64>, offset: i64, total: i64) -> (String, String) {
    let Some(limit) = limit else {
        return (String::new(), String::new());
    };
    let previous = if offset > 0 {
        format!("?limit={}&offset={}", limit, (offset - limit).max(0))
    } else {
        String::new()
    };
    let next = if offset + limit < total {
        format!("?limit={}&offset={}", limit, offset + limit)
    } else {
        String::new()
    };
    (previous, next)
}

// ============================================================================
// RECORD ACCESS
// ============================================================================

/// Uniform ownership-scoped CRUD over every record kind.
#[derive(Clone)]
pub struct RecordAccess {
    store: Arc<dyn Store>,
}

impl RecordAccess {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// List the owner's records matching `filter`, newest first with an
    /// id-descending tie-break. `limit: None` returns all matching rows.
    pub async fn list<K: OwnedRecord>(
        &self,
        owner: UserId,
        filter: &K::Filter,
        limit: Option<i64>,
        offset: i64,
    ) -> VitaResult<Page<K>> {
        let store = self.store.as_ref();
        let items = K::page(store, owner, filter, limit, offset).await?;
        let total = K::count(store, owner, filter).await?;
        let (previous, next) = page_cursors(limit, offset, total);
        Ok(Page {
            items,
            total,
            previous,
            next,
        })
    }

    /// Create a record for `owner`. The owner key is assigned here, never
    /// taken from the payload.
    pub async fn create<K: OwnedRecord>(
        &self,
        owner: UserId,
        fields: &K::Create,
    ) -> VitaResult<K> {
        K::insert(self.store.as_ref(), owner, fields).await
    }

    /// Fetch one record. Returns `None` when the id does not exist or the
    /// record belongs to someone else.
    pub async fn get<K: OwnedRecord>(&self, owner: UserId, id: RecordId) -> VitaResult<Option<K>> {
        let store = self.store.as_ref();
        let Some(record) = K::fetch(store, id).await? else {
            return Ok(None);
        };
        match K::owner(store, &record).await? {
            Some(user) if user == owner => Ok(Some(record)),
            _ => Ok(None),
        }
    }

    /// Apply a partial update. Only fields present in `update` change.
    /// Returns `None` (never an error) when the record is missing or
    /// foreign-owned.
    pub async fn update<K: OwnedRecord>(
        &self,
        owner: UserId,
        id: RecordId,
        update: &K::Update,
    ) -> VitaResult<Option<K>> {
        if self.get::<K>(owner, id).await?.is_none() {
            return Ok(None);
        }
        match K::persist_update(self.store.as_ref(), id, update).await {
            Ok(record) => Ok(Some(record)),
            // Deleted between the ownership check and the write.
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Delete a record. Returns `false` (never an error) when the record is
    /// missing or foreign-owned.
    pub async fn delete<K: OwnedRecord>(&self, owner: UserId, id: RecordId) -> VitaResult<bool> {
        if self.get::<K>(owner, id).await?.is_none() {
            return Ok(false);
        }
        match K::remove(self.store.as_ref(), id).await {
            Ok(()) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }
}

// ============================================================================
// KIND DESCRIPTORS
// ============================================================================

#[async_trait]
impl OwnedRecord for BodyRecord {
    type Create = NewBodyRecord;
    type Update = BodyRecordUpdate;
    type Filter = DateRangeFilter;

    const KIND: RecordKind = RecordKind::BodyRecord;

    fn id(&self) -> RecordId {
        self.id
    }

    async fn owner(_store: &dyn Store, record: &Self) -> VitaResult<Option<UserId>> {
        Ok(Some(record.user_id))
    }

    async fn insert(store: &dyn Store, owner: UserId, fields: &Self::Create) -> VitaResult<Self> {
        store.body_record_insert(owner, fields).await
    }

    async fn fetch(store: &dyn Store, id: RecordId) -> VitaResult<Option<Self>> {
        store.body_record_get(id).await
    }

    async fn persist_update(
        store: &dyn Store,
        id: RecordId,
        update: &Self::Update,
    ) -> VitaResult<Self> {
        store.body_record_update(id, update).await
    }

    async fn remove(store: &dyn Store, id: RecordId) -> VitaResult<()> {
        store.body_record_delete(id).await
    }

    async fn page(
        store: &dyn Store,
        owner: UserId,
        filter: &Self::Filter,
        limit: Option<i64>,
        offset: i64,
    ) -> VitaResult<Vec<Self>> {
        store.body_record_list(owner, filter, limit, offset).await
    }

    async fn count(store: &dyn Store, owner: UserId, filter: &Self::Filter) -> VitaResult<i64> {
        store.body_record_count(owner, filter).await
    }
}

#[async_trait]
impl OwnedRecord for Meal {
    type Create = NewMeal;
    type Update = MealUpdate;
    type Filter = MealFilter;

    const KIND: RecordKind = RecordKind::Meal;

    fn id(&self) -> RecordId {
        self.id
    }

    async fn owner(_store: &dyn Store, record: &Self) -> VitaResult<Option<UserId>> {
        Ok(Some(record.user_id))
    }

    async fn insert(store: &dyn Store, owner: UserId, fields: &Self::Create) -> VitaResult<Self> {
        store.meal_insert(owner, fields).await
    }

    async fn fetch(store: &dyn Store, id: RecordId) -> VitaResult<Option<Self>> {
        store.meal_get(id).await
    }

    async fn persist_update(
        store: &dyn Store,
        id: RecordId,
        update: &Self::Update,
    ) -> VitaResult<Self> {
        store.meal_update(id, update).await
    }

    async fn remove(store: &dyn Store, id: RecordId) -> VitaResult<()> {
        store.meal_delete(id).await
    }

    async fn page(
        store: &dyn Store,
        owner: UserId,
        filter: &Self::Filter,
        limit: Option<i64>,
        offset: i64,
    ) -> VitaResult<Vec<Self>> {
        store.meal_list(owner, filter, limit, offset).await
    }

    async fn count(store: &dyn Store, owner: UserId, filter: &Self::Filter) -> VitaResult<i64> {
        store.meal_count(owner, filter).await
    }
}

#[async_trait]
impl OwnedRecord for Exercise {
    type Create = NewExercise;
    type Update = ExerciseUpdate;
    type Filter = DateRangeFilter;

    const KIND: RecordKind = RecordKind::Exercise;

    fn id(&self) -> RecordId {
        self.id
    }

    async fn owner(_store: &dyn Store, record: &Self) -> VitaResult<Option<UserId>> {
        Ok(Some(record.user_id))
    }

    async fn insert(store: &dyn Store, owner: UserId, fields: &Self::Create) -> VitaResult<Self> {
        store.exercise_insert(owner, fields).await
    }

    async fn fetch(store: &dyn Store, id: RecordId) -> VitaResult<Option<Self>> {
        store.exercise_get(id).await
    }

    async fn persist_update(
        store: &dyn Store,
        id: RecordId,
        update: &Self::Update,
    ) -> VitaResult<Self> {
        store.exercise_update(id, update).await
    }

    async fn remove(store: &dyn Store, id: RecordId) -> VitaResult<()> {
        store.exercise_delete(id).await
    }

    async fn page(
        store: &dyn Store,
        owner: UserId,
        filter: &Self::Filter,
        limit: Option<i64>,
        offset: i64,
    ) -> VitaResult<Vec<Self>> {
        store.exercise_list(owner, filter, limit, offset).await
    }

    async fn count(store: &dyn Store, owner: UserId, filter: &Self::Filter) -> VitaResult<i64> {
        store.exercise_count(owner, filter).await
    }
}

#[async_trait]
impl OwnedRecord for Diary {
    type Create = NewDiary;
    type Update = DiaryUpdate;
    type Filter = DateRangeFilter;

    const KIND: RecordKind = RecordKind::Diary;

    fn id(&self) -> RecordId {
        self.id
    }

    async fn owner(_store: &dyn Store, record: &Self) -> VitaResult<Option<UserId>> {
        Ok(Some(record.user_id))
    }

    async fn insert(store: &dyn Store, owner: UserId, fields: &Self::Create) -> VitaResult<Self> {
        store.diary_insert(owner, fields).await
    }

    async fn fetch(store: &dyn Store, id: RecordId) -> VitaResult<Option<Self>> {
        store.diary_get(id).await
    }

    async fn persist_update(
        store: &dyn Store,
        id: RecordId,
        update: &Self::Update,
    ) -> VitaResult<Self> {
        store.diary_update(id, update).await
    }

    async fn remove(store: &dyn Store, id: RecordId) -> VitaResult<()> {
        store.diary_delete(id).await
    }

    async fn page(
        store: &dyn Store,
        owner: UserId,
        filter: &Self::Filter,
        limit: Option<i64>,
        offset: i64,
    ) -> VitaResult<Vec<Self>> {
        store.diary_list(owner, filter, limit, offset).await
    }

    async fn count(store: &dyn Store, owner: UserId, filter: &Self::Filter) -> VitaResult<i64> {
        store.diary_count(owner, filter).await
    }
}

#[async_trait]
impl OwnedRecord for Goal {
    type Create = NewGoal;
    type Update = GoalUpdate;
    type Filter = GoalFilter;

    const KIND: RecordKind = RecordKind::Goal;

    fn id(&self) -> RecordId {
        self.id
    }

    async fn owner(_store: &dyn Store, record: &Self) -> VitaResult<Option<UserId>> {
        Ok(Some(record.user_id))
    }

    async fn insert(store: &dyn Store, owner: UserId, fields: &Self::Create) -> VitaResult<Self> {
        store.goal_insert(owner, fields).await
    }

    async fn fetch(store: &dyn Store, id: RecordId) -> VitaResult<Option<Self>> {
        store.goal_get(id).await
    }

    async fn persist_update(
        store: &dyn Store,
        id: RecordId,
        update: &Self::Update,
    ) -> VitaResult<Self> {
        store.goal_update(id, update).await
    }

    async fn remove(store: &dyn Store, id: RecordId) -> VitaResult<()> {
        store.goal_delete(id).await
    }

    async fn page(
        store: &dyn Store,
        owner: UserId,
        filter: &Self::Filter,
        limit: Option<i64>,
        offset: i64,
    ) -> VitaResult<Vec<Self>> {
        store.goal_list(owner, filter, limit, offset).await
    }

    async fn count(store: &dyn Store, owner: UserId, filter: &Self::Filter) -> VitaResult<i64> {
        store.goal_count(owner, filter).await
    }
}

/// Create payload for a progress entry: the parent goal plus the fields.
/// Carried as one value so progress creation fits the generic contract.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressDraft {
    pub goal_id: GoalId,
    pub fields: NewGoalProgress,
}

#[async_trait]
impl OwnedRecord for GoalProgress {
    type Create = ProgressDraft;
    type Update = GoalProgressUpdate;
    type Filter = GoalProgressFilter;

    const KIND: RecordKind = RecordKind::GoalProgress;

    fn id(&self) -> RecordId {
        self.id
    }

    /// Ownership is transitive: progress belongs to whoever owns the goal.
    async fn owner(store: &dyn Store, record: &Self) -> VitaResult<Option<UserId>> {
        Ok(store.goal_get(record.goal_id).await?.map(|g| g.user_id))
    }

    async fn insert(store: &dyn Store, owner: UserId, fields: &Self::Create) -> VitaResult<Self> {
        // A foreign or missing parent goal is reported identically.
        match store.goal_get(fields.goal_id).await? {
            Some(goal) if goal.user_id == owner => {}
            _ => {
                return Err(StorageError::NotFound {
                    kind: RecordKind::Goal,
                    id: fields.goal_id,
                }
                .into())
            }
        }
        store.goal_progress_insert(fields.goal_id, &fields.fields).await
    }

    async fn fetch(store: &dyn Store, id: RecordId) -> VitaResult<Option<Self>> {
        store.goal_progress_get(id).await
    }

    async fn persist_update(
        store: &dyn Store,
        id: RecordId,
        update: &Self::Update,
    ) -> VitaResult<Self> {
        store.goal_progress_update(id, update).await
    }

    async fn remove(store: &dyn Store, id: RecordId) -> VitaResult<()> {
        store.goal_progress_delete(id).await
    }

    async fn page(
        store: &dyn Store,
        owner: UserId,
        filter: &Self::Filter,
        limit: Option<i64>,
        offset: i64,
    ) -> VitaResult<Vec<Self>> {
        match store.goal_get(filter.goal_id).await? {
            Some(goal) if goal.user_id == owner => {
                store
                    .goal_progress_list(filter.goal_id, &filter.range(), limit, offset)
                    .await
            }
            _ => Ok(Vec::new()),
        }
    }

    async fn count(store: &dyn Store, owner: UserId, filter: &Self::Filter) -> VitaResult<i64> {
        match store.goal_get(filter.goal_id).await? {
            Some(goal) if goal.user_id == owner => {
                store
                    .goal_progress_count(filter.goal_id, &filter.range())
                    .await
            }
            _ => Ok(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use chrono::NaiveDate;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn access_with_store() -> (RecordAccess, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (RecordAccess::new(store.clone()), store)
    }

    fn body_record(date: &str, weight: f64) -> NewBodyRecord {
        NewBodyRecord {
            date: d(date),
            weight,
            body_fat_percentage: None,
        }
    }

    #[tokio::test]
    async fn test_ownership_mismatch_reads_as_absent() {
        let (access, store) = access_with_store();
        let alice = store.add_user("alice@example.com");
        let bob = store.add_user("bob@example.com");

        let record: BodyRecord = access
            .create(alice.id, &body_record("2026-08-01", 70.0))
            .await
            .unwrap();

        // Bob sees Alice's record exactly as he would a nonexistent id.
        assert!(access
            .get::<BodyRecord>(bob.id, record.id)
            .await
            .unwrap()
            .is_none());
        assert!(access
            .get::<BodyRecord>(bob.id, 999_999)
            .await
            .unwrap()
            .is_none());

        let patch = BodyRecordUpdate {
            weight: Some(1.0),
            ..Default::default()
        };
        assert!(access
            .update::<BodyRecord>(bob.id, record.id, &patch)
            .await
            .unwrap()
            .is_none());
        assert!(!access
            .delete::<BodyRecord>(bob.id, record.id)
            .await
            .unwrap());

        // Alice still owns the unmodified record.
        let mine = access
            .get::<BodyRecord>(alice.id, record.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(mine.weight, 70.0);
    }

    #[tokio::test]
    async fn test_partial_update_leaves_absent_fields() {
        let (access, store) = access_with_store();
        let user = store.add_user("a@example.com");
        let record: BodyRecord = access
            .create(
                user.id,
                &NewBodyRecord {
                    date: d("2026-08-01"),
                    weight: 70.5,
                    body_fat_percentage: Some(18.2),
                },
            )
            .await
            .unwrap();

        let updated = access
            .update::<BodyRecord>(
                user.id,
                record.id,
                &BodyRecordUpdate {
                    weight: Some(69.9),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.weight, 69.9);
        assert_eq!(updated.body_fat_percentage, Some(18.2));
        assert_eq!(updated.date, d("2026-08-01"));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent_in_effect() {
        let (access, store) = access_with_store();
        let user = store.add_user("a@example.com");
        let record: BodyRecord = access
            .create(user.id, &body_record("2026-08-01", 70.0))
            .await
            .unwrap();

        assert!(access
            .delete::<BodyRecord>(user.id, record.id)
            .await
            .unwrap());
        // Second delete reports false, not an error.
        assert!(!access
            .delete::<BodyRecord>(user.id, record.id)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_list_cursors() {
        let (access, store) = access_with_store();
        let user = store.add_user("a@example.com");
        for day in 1..=25 {
            access
                .create::<BodyRecord>(user.id, &body_record(&format!("2026-07-{:02}", day), 70.0))
                .await
                .unwrap();
        }

        let first = access
            .list::<BodyRecord>(user.id, &DateRangeFilter::default(), Some(10), 0)
            .await
            .unwrap();
        assert_eq!(first.items.len(), 10);
        assert_eq!(first.total, 25);
        assert_eq!(first.previous, "");
        assert_eq!(first.next, "?limit=10&offset=10");

        let middle = access
            .list::<BodyRecord>(user.id, &DateRangeFilter::default(), Some(10), 10)
            .await
            .unwrap();
        assert_eq!(middle.previous, "?limit=10&offset=0");
        assert_eq!(middle.next, "?limit=10&offset=20");

        let last = access
            .list::<BodyRecord>(user.id, &DateRangeFilter::default(), Some(10), 20)
            .await
            .unwrap();
        assert_eq!(last.items.len(), 5);
        assert_eq!(last.previous, "?limit=10&offset=10");
        assert_eq!(last.next, "");
    }

    #[tokio::test]
    async fn test_list_without_limit_returns_everything() {
        let (access, store) = access_with_store();
        let user = store.add_user("a@example.com");
        for day in 1..=15 {
            access
                .create::<BodyRecord>(user.id, &body_record(&format!("2026-07-{:02}", day), 70.0))
                .await
                .unwrap();
        }

        let page = access
            .list::<BodyRecord>(user.id, &DateRangeFilter::default(), None, 0)
            .await
            .unwrap();
        assert_eq!(page.items.len(), 15);
        assert_eq!(page.previous, "");
        assert_eq!(page.next, "");
    }

    #[tokio::test]
    async fn test_equal_dates_order_by_id_descending() {
        let (access, store) = access_with_store();
        let user = store.add_user("a@example.com");
        let first: BodyRecord = access
            .create(user.id, &body_record("2026-08-01", 70.0))
            .await
            .unwrap();
        let second: BodyRecord = access
            .create(user.id, &body_record("2026-08-01", 70.1))
            .await
            .unwrap();

        for _ in 0..3 {
            let page = access
                .list::<BodyRecord>(user.id, &DateRangeFilter::default(), Some(10), 0)
                .await
                .unwrap();
            let ids: Vec<RecordId> = page.items.iter().map(|r| r.id).collect();
            assert_eq!(ids, vec![second.id, first.id]);
        }
    }

    #[tokio::test]
    async fn test_progress_ownership_is_transitive() {
        let (access, store) = access_with_store();
        let alice = store.add_user("alice@example.com");
        let bob = store.add_user("bob@example.com");

        let goal: Goal = access
            .create(
                alice.id,
                &NewGoal {
                    title: "Run 5k".to_string(),
                    description: None,
                    target_value: None,
                    target_date: None,
                    is_active: true,
                },
            )
            .await
            .unwrap();

        let progress: GoalProgress = access
            .create(
                alice.id,
                &ProgressDraft {
                    goal_id: goal.id,
                    fields: NewGoalProgress {
                        date: d("2026-08-01"),
                        current_value: None,
                        is_completed: true,
                        notes: None,
                    },
                },
            )
            .await
            .unwrap();

        assert!(access
            .get::<GoalProgress>(alice.id, progress.id)
            .await
            .unwrap()
            .is_some());
        assert!(access
            .get::<GoalProgress>(bob.id, progress.id)
            .await
            .unwrap()
            .is_none());

        // Bob cannot attach progress to Alice's goal; the goal reads as
        // absent to him.
        let err = access
            .create::<GoalProgress>(
                bob.id,
                &ProgressDraft {
                    goal_id: goal.id,
                    fields: NewGoalProgress {
                        date: d("2026-08-01"),
                        current_value: None,
                        is_completed: false,
                        notes: None,
                    },
                },
            )
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        // Listing a foreign goal's progress yields an empty page.
        let page = access
            .list::<GoalProgress>(bob.id, &GoalProgressFilter::for_goal(goal.id), Some(10), 0)
            .await
            .unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn test_goal_filter_active_only() {
        let (access, store) = access_with_store();
        let user = store.add_user("a@example.com");
        for (title, active) in [("a", true), ("b", true), ("c", false)] {
            access
                .create::<Goal>(
                    user.id,
                    &NewGoal {
                        title: title.to_string(),
                        description: None,
                        target_value: None,
                        target_date: None,
                        is_active: active,
                    },
                )
                .await
                .unwrap();
        }

        let active = access
            .list::<Goal>(
                user.id,
                &GoalFilter {
                    is_active: Some(true),
                },
                Some(10),
                0,
            )
            .await
            .unwrap();
        assert_eq!(active.total, 2);

        let all = access
            .list::<Goal>(user.id, &GoalFilter::default(), Some(10), 0)
            .await
            .unwrap();
        assert_eq!(all.total, 3);
    }
}
