//! VITA Storage - Storage Trait and In-Memory Implementation
//!
//! Defines the storage abstraction layer for VITA entities. The production
//! PostgreSQL implementation lives in vita-api; `MemoryStore` backs tests
//! and local development.

pub mod cache;
pub mod records;

pub use cache::{Cache, CacheStats, MemoryCache};
pub use records::{OwnedRecord, Page, ProgressDraft, RecordAccess};

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};

use vita_core::{
    BodyRecord, BodyRecordUpdate, DateRangeFilter, Diary, DiaryUpdate, Exercise, ExerciseUpdate,
    Goal, GoalFilter, GoalId, GoalProgress, GoalProgressUpdate, GoalUpdate, Meal, MealFilter,
    MealUpdate, NewBodyRecord, NewDiary, NewExercise, NewGoal, NewGoalProgress, NewMeal,
    RecordId, RecordKind, StorageError, User, UserId, VitaResult,
};

// ============================================================================
// STORE TRAIT
// ============================================================================

/// Storage capability for VITA entities.
///
/// Object-safe so the access layer and the stats engine can hold an
/// `Arc<dyn Store>` and swap PostgreSQL for the in-memory store in tests.
/// All list methods order newest-first by the kind's date field (creation
/// time for goals) with an id-descending tie-break, so pagination is
/// deterministic under equal dates. `limit: None` means no cap.
#[async_trait]
pub trait Store: Send + Sync {
    // === User Operations ===

    /// Page user ids strictly greater than `after_id`, ascending. Used by
    /// the periodic sweep to walk all users in bounded batches.
    async fn user_ids_page(&self, after_id: UserId, limit: i64) -> VitaResult<Vec<UserId>>;

    // === Body Record Operations ===

    async fn body_record_insert(
        &self,
        user_id: UserId,
        new: &NewBodyRecord,
    ) -> VitaResult<BodyRecord>;
    async fn body_record_get(&self, id: RecordId) -> VitaResult<Option<BodyRecord>>;
    async fn body_record_update(
        &self,
        id: RecordId,
        update: &BodyRecordUpdate,
    ) -> VitaResult<BodyRecord>;
    async fn body_record_delete(&self, id: RecordId) -> VitaResult<()>;
    async fn body_record_list(
        &self,
        user_id: UserId,
        filter: &DateRangeFilter,
        limit: Option<i64>,
        offset: i64,
    ) -> VitaResult<Vec<BodyRecord>>;
    async fn body_record_count(
        &self,
        user_id: UserId,
        filter: &DateRangeFilter,
    ) -> VitaResult<i64>;

    // === Meal Operations ===

    async fn meal_insert(&self, user_id: UserId, new: &NewMeal) -> VitaResult<Meal>;
    async fn meal_get(&self, id: RecordId) -> VitaResult<Option<Meal>>;
    async fn meal_update(&self, id: RecordId, update: &MealUpdate) -> VitaResult<Meal>;
    async fn meal_delete(&self, id: RecordId) -> VitaResult<()>;
    async fn meal_list(
        &self,
        user_id: UserId,
        filter: &MealFilter,
        limit: Option<i64>,
        offset: i64,
    ) -> VitaResult<Vec<Meal>>;
    async fn meal_count(&self, user_id: UserId, filter: &MealFilter) -> VitaResult<i64>;

    // === Exercise Operations ===

    async fn exercise_insert(&self, user_id: UserId, new: &NewExercise) -> VitaResult<Exercise>;
    async fn exercise_get(&self, id: RecordId) -> VitaResult<Option<Exercise>>;
    async fn exercise_update(&self, id: RecordId, update: &ExerciseUpdate)
        -> VitaResult<Exercise>;
    async fn exercise_delete(&self, id: RecordId) -> VitaResult<()>;
    async fn exercise_list(
        &self,
        user_id: UserId,
        filter: &DateRangeFilter,
        limit: Option<i64>,
        offset: i64,
    ) -> VitaResult<Vec<Exercise>>;
    async fn exercise_count(&self, user_id: UserId, filter: &DateRangeFilter) -> VitaResult<i64>;

    // === Diary Operations ===

    async fn diary_insert(&self, user_id: UserId, new: &NewDiary) -> VitaResult<Diary>;
    async fn diary_get(&self, id: RecordId) -> VitaResult<Option<Diary>>;
    async fn diary_update(&self, id: RecordId, update: &DiaryUpdate) -> VitaResult<Diary>;
    async fn diary_delete(&self, id: RecordId) -> VitaResult<()>;
    async fn diary_list(
        &self,
        user_id: UserId,
        filter: &DateRangeFilter,
        limit: Option<i64>,
        offset: i64,
    ) -> VitaResult<Vec<Diary>>;
    async fn diary_count(&self, user_id: UserId, filter: &DateRangeFilter) -> VitaResult<i64>;

    // === Goal Operations ===

    async fn goal_insert(&self, user_id: UserId, new: &NewGoal) -> VitaResult<Goal>;
    async fn goal_get(&self, id: GoalId) -> VitaResult<Option<Goal>>;
    async fn goal_update(&self, id: GoalId, update: &GoalUpdate) -> VitaResult<Goal>;
    /// Deletes the goal and all of its progress entries.
    async fn goal_delete(&self, id: GoalId) -> VitaResult<()>;
    async fn goal_list(
        &self,
        user_id: UserId,
        filter: &GoalFilter,
        limit: Option<i64>,
        offset: i64,
    ) -> VitaResult<Vec<Goal>>;
    async fn goal_count(&self, user_id: UserId, filter: &GoalFilter) -> VitaResult<i64>;

    // === Goal Progress Operations ===

    async fn goal_progress_insert(
        &self,
        goal_id: GoalId,
        new: &NewGoalProgress,
    ) -> VitaResult<GoalProgress>;
    async fn goal_progress_get(&self, id: RecordId) -> VitaResult<Option<GoalProgress>>;
    async fn goal_progress_update(
        &self,
        id: RecordId,
        update: &GoalProgressUpdate,
    ) -> VitaResult<GoalProgress>;
    async fn goal_progress_delete(&self, id: RecordId) -> VitaResult<()>;
    async fn goal_progress_list(
        &self,
        goal_id: GoalId,
        filter: &DateRangeFilter,
        limit: Option<i64>,
        offset: i64,
    ) -> VitaResult<Vec<GoalProgress>>;
    async fn goal_progress_count(
        &self,
        goal_id: GoalId,
        filter: &DateRangeFilter,
    ) -> VitaResult<i64>;

    // === Aggregate Queries ===

    /// Count distinct goals of `user_id` that have at least one completed
    /// progress entry dated within `[date_from, date_to]` inclusive. A goal
    /// counts once no matter how many completed entries it has in window.
    async fn count_completed_goals(
        &self,
        user_id: UserId,
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> VitaResult<i64>;

    /// Count currently-active goals of `user_id`, window-independent.
    async fn count_active_goals(&self, user_id: UserId) -> VitaResult<i64>;
}

// ============================================================================
// IN-MEMORY STORE
// ============================================================================

/// In-memory store for tests and local development.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<UserId, User>>,
    body_records: RwLock<HashMap<RecordId, BodyRecord>>,
    meals: RwLock<HashMap<RecordId, Meal>>,
    exercises: RwLock<HashMap<RecordId, Exercise>>,
    diaries: RwLock<HashMap<RecordId, Diary>>,
    goals: RwLock<HashMap<GoalId, Goal>>,
    goal_progress: RwLock<HashMap<RecordId, GoalProgress>>,
    // Single shared sequence; ids only need to be unique and monotonic.
    next_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Register a user directly. Registration flows are outside the core,
    /// but tests and the sweep need known users.
    pub fn add_user(&self, email: &str) -> User {
        let user = User {
            id: self.allocate_id(),
            email: email.to_string(),
            nickname: None,
            created_at: Utc::now(),
        };
        self.users
            .write()
            .expect("user map lock")
            .insert(user.id, user.clone());
        user
    }

    /// Clear all stored data.
    pub fn clear(&self) {
        self.users.write().expect("user map lock").clear();
        self.body_records.write().expect("body map lock").clear();
        self.meals.write().expect("meal map lock").clear();
        self.exercises.write().expect("exercise map lock").clear();
        self.diaries.write().expect("diary map lock").clear();
        self.goals.write().expect("goal map lock").clear();
        self.goal_progress.write().expect("progress map lock").clear();
    }

    pub fn goal_count_raw(&self) -> usize {
        self.goals.read().expect("goal map lock").len()
    }

    pub fn goal_progress_count_raw(&self) -> usize {
        self.goal_progress.read().expect("progress map lock").len()
    }
}

fn read_guard<T>(lock: &RwLock<T>) -> VitaResult<std::sync::RwLockReadGuard<'_, T>> {
    lock.read().map_err(|_| StorageError::LockPoisoned.into())
}

fn write_guard<T>(lock: &RwLock<T>) -> VitaResult<std::sync::RwLockWriteGuard<'_, T>> {
    lock.write().map_err(|_| StorageError::LockPoisoned.into())
}

fn not_found(kind: RecordKind, id: RecordId) -> vita_core::VitaError {
    StorageError::NotFound { kind, id }.into()
}

/// Sort newest-first with id-descending tie-break, then apply offset/limit.
fn paginate<T, K: Ord>(
    mut items: Vec<T>,
    sort_key: impl Fn(&T) -> K,
    limit: Option<i64>,
    offset: i64,
) -> Vec<T> {
    items.sort_by(|a, b| sort_key(b).cmp(&sort_key(a)));
    let iter = items.into_iter().skip(offset.max(0) as usize);
    match limit {
        Some(limit) => iter.take(limit.max(0) as usize).collect(),
        None => iter.collect(),
    }
}

#[async_trait]
impl Store for MemoryStore {
    // === User Operations ===

    async fn user_ids_page(&self, after_id: UserId, limit: i64) -> VitaResult<Vec<UserId>> {
        let users = read_guard(&self.users)?;
        let mut ids: Vec<UserId> = users.keys().copied().filter(|id| *id > after_id).collect();
        ids.sort_unstable();
        ids.truncate(limit.max(0) as usize);
        Ok(ids)
    }

    // === Body Record Operations ===

    async fn body_record_insert(
        &self,
        user_id: UserId,
        new: &NewBodyRecord,
    ) -> VitaResult<BodyRecord> {
        let now = Utc::now();
        let record = BodyRecord {
            id: self.allocate_id(),
            user_id,
            date: new.date,
            weight: new.weight,
            body_fat_percentage: new.body_fat_percentage,
            created_at: now,
            updated_at: now,
        };
        write_guard(&self.body_records)?.insert(record.id, record.clone());
        Ok(record)
    }

    async fn body_record_get(&self, id: RecordId) -> VitaResult<Option<BodyRecord>> {
        Ok(read_guard(&self.body_records)?.get(&id).cloned())
    }

    async fn body_record_update(
        &self,
        id: RecordId,
        update: &BodyRecordUpdate,
    ) -> VitaResult<BodyRecord> {
        let mut records = write_guard(&self.body_records)?;
        let record = records
            .get_mut(&id)
            .ok_or_else(|| not_found(RecordKind::BodyRecord, id))?;
        if let Some(date) = update.date {
            record.date = date;
        }
        if let Some(weight) = update.weight {
            record.weight = weight;
        }
        if let Some(body_fat) = update.body_fat_percentage {
            record.body_fat_percentage = Some(body_fat);
        }
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    async fn body_record_delete(&self, id: RecordId) -> VitaResult<()> {
        write_guard(&self.body_records)?
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found(RecordKind::BodyRecord, id))
    }

    async fn body_record_list(
        &self,
        user_id: UserId,
        filter: &DateRangeFilter,
        limit: Option<i64>,
        offset: i64,
    ) -> VitaResult<Vec<BodyRecord>> {
        let records = read_guard(&self.body_records)?;
        let matching: Vec<BodyRecord> = records
            .values()
            .filter(|r| r.user_id == user_id && filter.contains(r.date))
            .cloned()
            .collect();
        Ok(paginate(matching, |r| (r.date, r.id), limit, offset))
    }

    async fn body_record_count(
        &self,
        user_id: UserId,
        filter: &DateRangeFilter,
    ) -> VitaResult<i64> {
        let records = read_guard(&self.body_records)?;
        Ok(records
            .values()
            .filter(|r| r.user_id == user_id && filter.contains(r.date))
            .count() as i64)
    }

    // === Meal Operations ===

    async fn meal_insert(&self, user_id: UserId, new: &NewMeal) -> VitaResult<Meal> {
        let now = Utc::now();
        let meal = Meal {
            id: self.allocate_id(),
            user_id,
            date: new.date,
            meal_type: new.meal_type,
            description: new.description.clone(),
            calories: new.calories,
            created_at: now,
            updated_at: now,
        };
        write_guard(&self.meals)?.insert(meal.id, meal.clone());
        Ok(meal)
    }

    async fn meal_get(&self, id: RecordId) -> VitaResult<Option<Meal>> {
        Ok(read_guard(&self.meals)?.get(&id).cloned())
    }

    async fn meal_update(&self, id: RecordId, update: &MealUpdate) -> VitaResult<Meal> {
        let mut meals = write_guard(&self.meals)?;
        let meal = meals
            .get_mut(&id)
            .ok_or_else(|| not_found(RecordKind::Meal, id))?;
        if let Some(date) = update.date {
            meal.date = date;
        }
        if let Some(meal_type) = update.meal_type {
            meal.meal_type = meal_type;
        }
        if let Some(description) = &update.description {
            meal.description = Some(description.clone());
        }
        if let Some(calories) = update.calories {
            meal.calories = Some(calories);
        }
        meal.updated_at = Utc::now();
        Ok(meal.clone())
    }

    async fn meal_delete(&self, id: RecordId) -> VitaResult<()> {
        write_guard(&self.meals)?
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found(RecordKind::Meal, id))
    }

    async fn meal_list(
        &self,
        user_id: UserId,
        filter: &MealFilter,
        limit: Option<i64>,
        offset: i64,
    ) -> VitaResult<Vec<Meal>> {
        let range = filter.range();
        let meals = read_guard(&self.meals)?;
        let matching: Vec<Meal> = meals
            .values()
            .filter(|m| {
                m.user_id == user_id
                    && range.contains(m.date)
                    && filter.meal_type.map_or(true, |t| m.meal_type == t)
            })
            .cloned()
            .collect();
        Ok(paginate(matching, |m| (m.date, m.id), limit, offset))
    }

    async fn meal_count(&self, user_id: UserId, filter: &MealFilter) -> VitaResult<i64> {
        let range = filter.range();
        let meals = read_guard(&self.meals)?;
        Ok(meals
            .values()
            .filter(|m| {
                m.user_id == user_id
                    && range.contains(m.date)
                    && filter.meal_type.map_or(true, |t| m.meal_type == t)
            })
            .count() as i64)
    }

    // === Exercise Operations ===

    async fn exercise_insert(&self, user_id: UserId, new: &NewExercise) -> VitaResult<Exercise> {
        let now = Utc::now();
        let exercise = Exercise {
            id: self.allocate_id(),
            user_id,
            date: new.date,
            name: new.name.clone(),
            duration_min: new.duration_min,
            calories: new.calories,
            created_at: now,
            updated_at: now,
        };
        write_guard(&self.exercises)?.insert(exercise.id, exercise.clone());
        Ok(exercise)
    }

    async fn exercise_get(&self, id: RecordId) -> VitaResult<Option<Exercise>> {
        Ok(read_guard(&self.exercises)?.get(&id).cloned())
    }

    async fn exercise_update(
        &self,
        id: RecordId,
        update: &ExerciseUpdate,
    ) -> VitaResult<Exercise> {
        let mut exercises = write_guard(&self.exercises)?;
        let exercise = exercises
            .get_mut(&id)
            .ok_or_else(|| not_found(RecordKind::Exercise, id))?;
        if let Some(date) = update.date {
            exercise.date = date;
        }
        if let Some(name) = &update.name {
            exercise.name = name.clone();
        }
        if let Some(duration_min) = update.duration_min {
            exercise.duration_min = duration_min;
        }
        if let Some(calories) = update.calories {
            exercise.calories = Some(calories);
        }
        exercise.updated_at = Utc::now();
        Ok(exercise.clone())
    }

    async fn exercise_delete(&self, id: RecordId) -> VitaResult<()> {
        write_guard(&self.exercises)?
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found(RecordKind::Exercise, id))
    }

    async fn exercise_list(
        &self,
        user_id: UserId,
        filter: &DateRangeFilter,
        limit: Option<i64>,
        offset: i64,
    ) -> VitaResult<Vec<Exercise>> {
        let exercises = read_guard(&self.exercises)?;
        let matching: Vec<Exercise> = exercises
            .values()
            .filter(|e| e.user_id == user_id && filter.contains(e.date))
            .cloned()
            .collect();
        Ok(paginate(matching, |e| (e.date, e.id), limit, offset))
    }

    async fn exercise_count(
        &self,
        user_id: UserId,
        filter: &DateRangeFilter,
    ) -> VitaResult<i64> {
        let exercises = read_guard(&self.exercises)?;
        Ok(exercises
            .values()
            .filter(|e| e.user_id == user_id && filter.contains(e.date))
            .count() as i64)
    }

    // === Diary Operations ===

    async fn diary_insert(&self, user_id: UserId, new: &NewDiary) -> VitaResult<Diary> {
        let now = Utc::now();
        let diary = Diary {
            id: self.allocate_id(),
            user_id,
            date: new.date,
            time: new.time,
            content: new.content.clone(),
            created_at: now,
            updated_at: now,
        };
        write_guard(&self.diaries)?.insert(diary.id, diary.clone());
        Ok(diary)
    }

    async fn diary_get(&self, id: RecordId) -> VitaResult<Option<Diary>> {
        Ok(read_guard(&self.diaries)?.get(&id).cloned())
    }

    async fn diary_update(&self, id: RecordId, update: &DiaryUpdate) -> VitaResult<Diary> {
        let mut diaries = write_guard(&self.diaries)?;
        let diary = diaries
            .get_mut(&id)
            .ok_or_else(|| not_found(RecordKind::Diary, id))?;
        if let Some(date) = update.date {
            diary.date = date;
        }
        if let Some(time) = update.time {
            diary.time = Some(time);
        }
        if let Some(content) = &update.content {
            diary.content = content.clone();
        }
        diary.updated_at = Utc::now();
        Ok(diary.clone())
    }

    async fn diary_delete(&self, id: RecordId) -> VitaResult<()> {
        write_guard(&self.diaries)?
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found(RecordKind::Diary, id))
    }

    async fn diary_list(
        &self,
        user_id: UserId,
        filter: &DateRangeFilter,
        limit: Option<i64>,
        offset: i64,
    ) -> VitaResult<Vec<Diary>> {
        let diaries = read_guard(&self.diaries)?;
        let matching: Vec<Diary> = diaries
            .values()
            .filter(|d| d.user_id == user_id && filter.contains(d.date))
            .cloned()
            .collect();
        Ok(paginate(matching, |d| (d.date, d.id), limit, offset))
    }

    async fn diary_count(&self, user_id: UserId, filter: &DateRangeFilter) -> VitaResult<i64> {
        let diaries = read_guard(&self.diaries)?;
        Ok(diaries
            .values()
            .filter(|d| d.user_id == user_id && filter.contains(d.date))
            .count() as i64)
    }

    // === Goal Operations ===

    async fn goal_insert(&self, user_id: UserId, new: &NewGoal) -> VitaResult<Goal> {
        let now = Utc::now();
        let goal = Goal {
            id: self.allocate_id(),
            user_id,
            title: new.title.clone(),
            description: new.description.clone(),
            target_value: new.target_value,
            target_date: new.target_date,
            is_active: new.is_active,
            created_at: now,
            updated_at: now,
        };
        write_guard(&self.goals)?.insert(goal.id, goal.clone());
        Ok(goal)
    }

    async fn goal_get(&self, id: GoalId) -> VitaResult<Option<Goal>> {
        Ok(read_guard(&self.goals)?.get(&id).cloned())
    }

    async fn goal_update(&self, id: GoalId, update: &GoalUpdate) -> VitaResult<Goal> {
        let mut goals = write_guard(&self.goals)?;
        let goal = goals
            .get_mut(&id)
            .ok_or_else(|| not_found(RecordKind::Goal, id))?;
        if let Some(title) = &update.title {
            goal.title = title.clone();
        }
        if let Some(description) = &update.description {
            goal.description = Some(description.clone());
        }
        if let Some(target_value) = update.target_value {
            goal.target_value = Some(target_value);
        }
        if let Some(target_date) = update.target_date {
            goal.target_date = Some(target_date);
        }
        if let Some(is_active) = update.is_active {
            goal.is_active = is_active;
        }
        goal.updated_at = Utc::now();
        Ok(goal.clone())
    }

    async fn goal_delete(&self, id: GoalId) -> VitaResult<()> {
        let removed = write_guard(&self.goals)?.remove(&id);
        if removed.is_none() {
            return Err(not_found(RecordKind::Goal, id));
        }
        // Cascade to progress entries, like ON DELETE CASCADE.
        write_guard(&self.goal_progress)?.retain(|_, p| p.goal_id != id);
        Ok(())
    }

    async fn goal_list(
        &self,
        user_id: UserId,
        filter: &GoalFilter,
        limit: Option<i64>,
        offset: i64,
    ) -> VitaResult<Vec<Goal>> {
        let goals = read_guard(&self.goals)?;
        let matching: Vec<Goal> = goals
            .values()
            .filter(|g| {
                g.user_id == user_id && filter.is_active.map_or(true, |a| g.is_active == a)
            })
            .cloned()
            .collect();
        Ok(paginate(matching, |g| (g.created_at, g.id), limit, offset))
    }

    async fn goal_count(&self, user_id: UserId, filter: &GoalFilter) -> VitaResult<i64> {
        let goals = read_guard(&self.goals)?;
        Ok(goals
            .values()
            .filter(|g| {
                g.user_id == user_id && filter.is_active.map_or(true, |a| g.is_active == a)
            })
            .count() as i64)
    }

    // === Goal Progress Operations ===

    async fn goal_progress_insert(
        &self,
        goal_id: GoalId,
        new: &NewGoalProgress,
    ) -> VitaResult<GoalProgress> {
        // Existence of the parent goal is an invariant, not an ownership
        // check; the access layer has already resolved the owner.
        if read_guard(&self.goals)?.get(&goal_id).is_none() {
            return Err(not_found(RecordKind::Goal, goal_id));
        }
        let now = Utc::now();
        let progress = GoalProgress {
            id: self.allocate_id(),
            goal_id,
            date: new.date,
            current_value: new.current_value,
            is_completed: new.is_completed,
            notes: new.notes.clone(),
            created_at: now,
            updated_at: now,
        };
        write_guard(&self.goal_progress)?.insert(progress.id, progress.clone());
        Ok(progress)
    }

    async fn goal_progress_get(&self, id: RecordId) -> VitaResult<Option<GoalProgress>> {
        Ok(read_guard(&self.goal_progress)?.get(&id).cloned())
    }

    async fn goal_progress_update(
        &self,
        id: RecordId,
        update: &GoalProgressUpdate,
    ) -> VitaResult<GoalProgress> {
        let mut entries = write_guard(&self.goal_progress)?;
        let progress = entries
            .get_mut(&id)
            .ok_or_else(|| not_found(RecordKind::GoalProgress, id))?;
        if let Some(date) = update.date {
            progress.date = date;
        }
        if let Some(current_value) = update.current_value {
            progress.current_value = Some(current_value);
        }
        if let Some(is_completed) = update.is_completed {
            progress.is_completed = is_completed;
        }
        if let Some(notes) = &update.notes {
            progress.notes = Some(notes.clone());
        }
        progress.updated_at = Utc::now();
        Ok(progress.clone())
    }

    async fn goal_progress_delete(&self, id: RecordId) -> VitaResult<()> {
        write_guard(&self.goal_progress)?
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found(RecordKind::GoalProgress, id))
    }

    async fn goal_progress_list(
        &self,
        goal_id: GoalId,
        filter: &DateRangeFilter,
        limit: Option<i64>,
        offset: i64,
    ) -> VitaResult<Vec<GoalProgress>> {
        let entries = read_guard(&self.goal_progress)?;
        let matching: Vec<GoalProgress> = entries
            .values()
            .filter(|p| p.goal_id == goal_id && filter.contains(p.date))
            .cloned()
            .collect();
        Ok(paginate(matching, |p| (p.date, p.id), limit, offset))
    }

    async fn goal_progress_count(
        &self,
        goal_id: GoalId,
        filter: &DateRangeFilter,
    ) -> VitaResult<i64> {
        let entries = read_guard(&self.goal_progress)?;
        Ok(entries
            .values()
            .filter(|p| p.goal_id == goal_id && filter.contains(p.date))
            .count() as i64)
    }

    // === Aggregate Queries ===

    async fn count_completed_goals(
        &self,
        user_id: UserId,
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> VitaResult<i64> {
        let goals = read_guard(&self.goals)?;
        let entries = read_guard(&self.goal_progress)?;
        let owned: std::collections::HashSet<GoalId> = goals
            .values()
            .filter(|g| g.user_id == user_id)
            .map(|g| g.id)
            .collect();
        let completed: std::collections::HashSet<GoalId> = entries
            .values()
            .filter(|p| {
                owned.contains(&p.goal_id)
                    && p.is_completed
                    && p.date >= date_from
                    && p.date <= date_to
            })
            .map(|p| p.goal_id)
            .collect();
        Ok(completed.len() as i64)
    }

    async fn count_active_goals(&self, user_id: UserId) -> VitaResult<i64> {
        let goals = read_guard(&self.goals)?;
        Ok(goals
            .values()
            .filter(|g| g.user_id == user_id && g.is_active)
            .count() as i64)
    }
}
