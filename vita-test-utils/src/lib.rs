//! VITA Test Utilities
//!
//! Centralized test infrastructure for the VITA workspace:
//! - Fixture constructors for entities and payloads
//! - Seeded in-memory stores for common scenarios
//! - A failure-injecting store wrapper for resilience tests

// Re-export the in-memory implementations from their source crate
pub use vita_storage::{MemoryCache, MemoryStore};

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use vita_core::{
    BodyRecord, BodyRecordUpdate, DateRangeFilter, Diary, DiaryUpdate, Exercise, ExerciseUpdate,
    Goal, GoalFilter, GoalId, GoalProgress, GoalProgressUpdate, GoalUpdate, Meal, MealFilter,
    MealType, MealUpdate, NewBodyRecord, NewDiary, NewExercise, NewGoal, NewGoalProgress,
    NewMeal, RecordId, StorageError, User, UserId, VitaResult,
};
use vita_storage::Store;

// ============================================================================
// FIXTURE CONSTRUCTORS
// ============================================================================

/// Parse a `YYYY-MM-DD` literal. Panics on bad input; tests only.
pub fn date(s: &str) -> NaiveDate {
    s.parse().expect("valid test date literal")
}

pub fn new_goal(title: &str) -> NewGoal {
    NewGoal {
        title: title.to_string(),
        description: None,
        target_value: None,
        target_date: None,
        is_active: true,
    }
}

pub fn new_progress(day: NaiveDate, is_completed: bool) -> NewGoalProgress {
    NewGoalProgress {
        date: day,
        current_value: None,
        is_completed,
        notes: None,
    }
}

pub fn new_body_record(day: NaiveDate, weight: f64) -> NewBodyRecord {
    NewBodyRecord {
        date: day,
        weight,
        body_fat_percentage: None,
    }
}

pub fn new_meal(day: NaiveDate, meal_type: MealType) -> NewMeal {
    NewMeal {
        date: day,
        meal_type,
        description: None,
        calories: None,
    }
}

pub fn new_exercise(day: NaiveDate, name: &str) -> NewExercise {
    NewExercise {
        date: day,
        name: name.to_string(),
        duration_min: 30,
        calories: None,
    }
}

pub fn new_diary(day: NaiveDate, content: &str) -> NewDiary {
    NewDiary {
        date: day,
        time: None,
        content: content.to_string(),
    }
}

// ============================================================================
// SEEDED STORES
// ============================================================================

/// A fresh store with one registered user.
pub async fn store_with_user() -> (Arc<MemoryStore>, User) {
    let store = Arc::new(MemoryStore::new());
    let user = store.add_user("user@example.com");
    (store, user)
}

/// The canonical achievement-rate scenario: `active` active goals, of which
/// `completed_in_window` have one completed progress entry dated `today`.
pub async fn store_with_goal_scenario(
    active: usize,
    completed_in_window: usize,
    today: NaiveDate,
) -> (Arc<MemoryStore>, User) {
    let (store, user) = store_with_user().await;
    for i in 0..active {
        let goal = store
            .goal_insert(user.id, &new_goal(&format!("goal-{}", i)))
            .await
            .expect("seed goal");
        if i < completed_in_window {
            store
                .goal_progress_insert(goal.id, &new_progress(today, true))
                .await
                .expect("seed progress");
        }
    }
    (store, user)
}

// ============================================================================
// FAILURE-INJECTING STORE
// ============================================================================

/// Store wrapper that fails aggregate queries for a chosen set of users.
///
/// Used to verify that the periodic sweep continues past individual per-user
/// computation errors. Everything else delegates to the wrapped store.
pub struct FlakyStore {
    inner: Arc<MemoryStore>,
    failing_users: HashSet<UserId>,
}

impl FlakyStore {
    pub fn new(inner: Arc<MemoryStore>, failing_users: impl IntoIterator<Item = UserId>) -> Self {
        Self {
            inner,
            failing_users: failing_users.into_iter().collect(),
        }
    }

    fn check(&self, user_id: UserId) -> VitaResult<()> {
        if self.failing_users.contains(&user_id) {
            return Err(StorageError::QueryFailed {
                reason: format!("injected failure for user {}", user_id),
            }
            .into());
        }
        Ok(())
    }
}

#[async_trait]
impl Store for FlakyStore {
    async fn user_ids_page(&self, after_id: UserId, limit: i64) -> VitaResult<Vec<UserId>> {
        self.inner.user_ids_page(after_id, limit).await
    }

    async fn body_record_insert(
        &self,
        user_id: UserId,
        new: &NewBodyRecord,
    ) -> VitaResult<BodyRecord> {
        self.inner.body_record_insert(user_id, new).await
    }

    async fn body_record_get(&self, id: RecordId) -> VitaResult<Option<BodyRecord>> {
        self.inner.body_record_get(id).await
    }

    async fn body_record_update(
        &self,
        id: RecordId,
        update: &BodyRecordUpdate,
    ) -> VitaResult<BodyRecord> {
        self.inner.body_record_update(id, update).await
    }

    async fn body_record_delete(&self, id: RecordId) -> VitaResult<()> {
        self.inner.body_record_delete(id).await
    }

    async fn body_record_list(
        &self,
        user_id: UserId,
        filter: &DateRangeFilter,
        limit: Option<i64>,
        offset: i64,
    ) -> VitaResult<Vec<BodyRecord>> {
        self.inner
            .body_record_list(user_id, filter, limit, offset)
            .await
    }

    async fn body_record_count(
        &self,
        user_id: UserId,
        filter: &DateRangeFilter,
    ) -> VitaResult<i64> {
        self.inner.body_record_count(user_id, filter).await
    }

    async fn meal_insert(&self, user_id: UserId, new: &NewMeal) -> VitaResult<Meal> {
        self.inner.meal_insert(user_id, new).await
    }

    async fn meal_get(&self, id: RecordId) -> VitaResult<Option<Meal>> {
        self.inner.meal_get(id).await
    }

    async fn meal_update(&self, id: RecordId, update: &MealUpdate) -> VitaResult<Meal> {
        self.inner.meal_update(id, update).await
    }

    async fn meal_delete(&self, id: RecordId) -> VitaResult<()> {
        self.inner.meal_delete(id).await
    }

    async fn meal_list(
        &self,
        user_id: UserId,
        filter: &MealFilter,
        limit: Option<i64>,
        offset: i64,
    ) -> VitaResult<Vec<Meal>> {
        self.inner.meal_list(user_id, filter, limit, offset).await
    }

    async fn meal_count(&self, user_id: UserId, filter: &MealFilter) -> VitaResult<i64> {
        self.inner.meal_count(user_id, filter).await
    }

    async fn exercise_insert(&self, user_id: UserId, new: &NewExercise) -> VitaResult<Exercise> {
        self.inner.exercise_insert(user_id, new).await
    }

    async fn exercise_get(&self, id: RecordId) -> VitaResult<Option<Exercise>> {
        self.inner.exercise_get(id).await
    }

    async fn exercise_update(
        &self,
        id: RecordId,
        update: &ExerciseUpdate,
    ) -> VitaResult<Exercise> {
        self.inner.exercise_update(id, update).await
    }

    async fn exercise_delete(&self, id: RecordId) -> VitaResult<()> {
        self.inner.exercise_delete(id).await
    }

    async fn exercise_list(
        &self,
        user_id: UserId,
        filter: &DateRangeFilter,
        limit: Option<i64>,
        offset: i64,
    ) -> VitaResult<Vec<Exercise>> {
        self.inner
            .exercise_list(user_id, filter, limit, offset)
            .await
    }

    async fn exercise_count(
        &self,
        user_id: UserId,
        filter: &DateRangeFilter,
    ) -> VitaResult<i64> {
        self.inner.exercise_count(user_id, filter).await
    }

    async fn diary_insert(&self, user_id: UserId, new: &NewDiary) -> VitaResult<Diary> {
        self.inner.diary_insert(user_id, new).await
    }

    async fn diary_get(&self, id: RecordId) -> VitaResult<Option<Diary>> {
        self.inner.diary_get(id).await
    }

    async fn diary_update(&self, id: RecordId, update: &DiaryUpdate) -> VitaResult<Diary> {
        self.inner.diary_update(id, update).await
    }

    async fn diary_delete(&self, id: RecordId) -> VitaResult<()> {
        self.inner.diary_delete(id).await
    }

    async fn diary_list(
        &self,
        user_id: UserId,
        filter: &DateRangeFilter,
        limit: Option<i64>,
        offset: i64,
    ) -> VitaResult<Vec<Diary>> {
        self.inner.diary_list(user_id, filter, limit, offset).await
    }

    async fn diary_count(&self, user_id: UserId, filter: &DateRangeFilter) -> VitaResult<i64> {
        self.inner.diary_count(user_id, filter).await
    }

    async fn goal_insert(&self, user_id: UserId, new: &NewGoal) -> VitaResult<Goal> {
        self.inner.goal_insert(user_id, new).await
    }

    async fn goal_get(&self, id: GoalId) -> VitaResult<Option<Goal>> {
        self.inner.goal_get(id).await
    }

    async fn goal_update(&self, id: GoalId, update: &GoalUpdate) -> VitaResult<Goal> {
        self.inner.goal_update(id, update).await
    }

    async fn goal_delete(&self, id: GoalId) -> VitaResult<()> {
        self.inner.goal_delete(id).await
    }

    async fn goal_list(
        &self,
        user_id: UserId,
        filter: &GoalFilter,
        limit: Option<i64>,
        offset: i64,
    ) -> VitaResult<Vec<Goal>> {
        self.inner.goal_list(user_id, filter, limit, offset).await
    }

    async fn goal_count(&self, user_id: UserId, filter: &GoalFilter) -> VitaResult<i64> {
        self.inner.goal_count(user_id, filter).await
    }

    async fn goal_progress_insert(
        &self,
        goal_id: GoalId,
        new: &NewGoalProgress,
    ) -> VitaResult<GoalProgress> {
        self.inner.goal_progress_insert(goal_id, new).await
    }

    async fn goal_progress_get(&self, id: RecordId) -> VitaResult<Option<GoalProgress>> {
        self.inner.goal_progress_get(id).await
    }

    async fn goal_progress_update(
        &self,
        id: RecordId,
        update: &GoalProgressUpdate,
    ) -> VitaResult<GoalProgress> {
        self.inner.goal_progress_update(id, update).await
    }

    async fn goal_progress_delete(&self, id: RecordId) -> VitaResult<()> {
        self.inner.goal_progress_delete(id).await
    }

    async fn goal_progress_list(
        &self,
        goal_id: GoalId,
        filter: &DateRangeFilter,
        limit: Option<i64>,
        offset: i64,
    ) -> VitaResult<Vec<GoalProgress>> {
        self.inner
            .goal_progress_list(goal_id, filter, limit, offset)
            .await
    }

    async fn goal_progress_count(
        &self,
        goal_id: GoalId,
        filter: &DateRangeFilter,
    ) -> VitaResult<i64> {
        self.inner.goal_progress_count(goal_id, filter).await
    }

    async fn count_completed_goals(
        &self,
        user_id: UserId,
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> VitaResult<i64> {
        self.check(user_id)?;
        self.inner
            .count_completed_goals(user_id, date_from, date_to)
            .await
    }

    async fn count_active_goals(&self, user_id: UserId) -> VitaResult<i64> {
        self.check(user_id)?;
        self.inner.count_active_goals(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_flaky_store_fails_only_marked_users() {
        let (inner, user) = store_with_user().await;
        let other = inner.add_user("other@example.com");
        let flaky = FlakyStore::new(inner, [user.id]);

        assert!(flaky.count_active_goals(user.id).await.is_err());
        assert!(flaky.count_active_goals(other.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_goal_scenario_seeding() {
        let today = date("2026-08-07");
        let (store, user) = store_with_goal_scenario(4, 2, today).await;
        assert_eq!(store.count_active_goals(user.id).await.unwrap(), 4);
        assert_eq!(
            store
                .count_completed_goals(user.id, date("2026-07-09"), today)
                .await
                .unwrap(),
            2
        );
    }
}
