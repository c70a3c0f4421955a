//! Database Connection Pool Module
//!
//! PostgreSQL connection pooling via deadpool-postgres and the production
//! implementation of the `Store` capability. All queries are parameterized;
//! filtered lists build their WHERE clauses dynamically from the kind's
//! filter struct, and partial updates emit SET clauses only for fields
//! present in the payload.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use deadpool_postgres::{Config, ManagerConfig, Pool, RecyclingMethod, Runtime};
use tokio_postgres::types::ToSql;
use tokio_postgres::{NoTls, Row};

use vita_core::{
    BodyRecord, BodyRecordUpdate, DateRangeFilter, Diary, DiaryUpdate, Exercise, ExerciseUpdate,
    Goal, GoalFilter, GoalId, GoalProgress, GoalProgressUpdate, GoalUpdate, Meal, MealFilter,
    MealUpdate, NewBodyRecord, NewDiary, NewExercise, NewGoal, NewGoalProgress, NewMeal,
    RecordId, RecordKind, StorageError, UserId, VitaError, VitaResult,
};
use vita_storage::Store;

// ============================================================================
// CONNECTION POOL CONFIGURATION
// ============================================================================

/// Database connection pool configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// PostgreSQL host
    pub host: String,
    /// PostgreSQL port
    pub port: u16,
    /// Database name
    pub dbname: String,
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
    /// Maximum pool size
    pub max_size: usize,
    /// Connection timeout
    pub timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "vita".to_string(),
            user: "postgres".to_string(),
            password: "".to_string(),
            max_size: 16,
            timeout: Duration::from_secs(30),
        }
    }
}

impl DbConfig {
    /// Create a new database configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("VITA_DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("VITA_DB_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5432),
            dbname: std::env::var("VITA_DB_NAME").unwrap_or_else(|_| "vita".to_string()),
            user: std::env::var("VITA_DB_USER").unwrap_or_else(|_| "postgres".to_string()),
            password: std::env::var("VITA_DB_PASSWORD").unwrap_or_default(),
            max_size: std::env::var("VITA_DB_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(16),
            timeout: Duration::from_secs(
                std::env::var("VITA_DB_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
        }
    }

    /// Create a connection pool from this configuration.
    pub fn create_pool(&self) -> VitaResult<Pool> {
        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let pool = cfg.create_pool(Some(Runtime::Tokio1), NoTls).map_err(|e| {
            VitaError::from(StorageError::ConnectionUnavailable {
                reason: format!("Failed to create pool: {}", e),
            })
        })?;

        Ok(pool)
    }
}

// ============================================================================
// DATABASE CLIENT
// ============================================================================

/// Database client wrapping a connection pool.
#[derive(Clone)]
pub struct DbClient {
    pool: Pool,
}

impl DbClient {
    /// Create a new database client with the given pool.
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Create a new database client from configuration.
    pub fn from_config(config: &DbConfig) -> VitaResult<Self> {
        let pool = config.create_pool()?;
        Ok(Self::new(pool))
    }

    /// Get the current pool size for observability.
    pub fn pool_size(&self) -> usize {
        self.pool.status().size
    }

    /// Get a connection from the pool.
    async fn get_conn(&self) -> VitaResult<deadpool_postgres::Object> {
        self.pool.get().await.map_err(|e| {
            StorageError::ConnectionUnavailable {
                reason: e.to_string(),
            }
            .into()
        })
    }
}

fn query_err(err: tokio_postgres::Error) -> VitaError {
    StorageError::QueryFailed {
        reason: err.to_string(),
    }
    .into()
}

fn not_found(kind: RecordKind, id: RecordId) -> VitaError {
    StorageError::NotFound { kind, id }.into()
}

type SqlParam<'a> = &'a (dyn ToSql + Sync);

/// Append `date >= / <=` conditions for an optional date range.
fn push_date_range<'a>(
    filter: &'a DateRangeFilter,
    conditions: &mut Vec<String>,
    params: &mut Vec<SqlParam<'a>>,
) {
    if let Some(date_from) = &filter.date_from {
        params.push(date_from);
        conditions.push(format!("date >= ${}", params.len()));
    }
    if let Some(date_to) = &filter.date_to {
        params.push(date_to);
        conditions.push(format!("date <= ${}", params.len()));
    }
}

/// Append `ORDER BY .. LIMIT .. OFFSET ..` for the uniform pagination
/// contract (newest-first, id-descending tie-break, optional cap).
fn push_page_clause<'a>(
    sql: &mut String,
    order_by: &str,
    limit: &'a Option<i64>,
    offset: &'a i64,
    params: &mut Vec<SqlParam<'a>>,
) {
    sql.push_str(" ORDER BY ");
    sql.push_str(order_by);
    if let Some(limit) = limit {
        params.push(limit);
        sql.push_str(&format!(" LIMIT ${}", params.len()));
    }
    params.push(offset);
    sql.push_str(&format!(" OFFSET ${}", params.len()));
}

// ============================================================================
// ROW MAPPERS
// ============================================================================

const BODY_RECORD_COLS: &str =
    "id, user_id, date, weight, body_fat_percentage, created_at, updated_at";
const MEAL_COLS: &str = "id, user_id, date, meal_type, description, calories, created_at, updated_at";
const EXERCISE_COLS: &str =
    "id, user_id, date, name, duration_min, calories, created_at, updated_at";
const DIARY_COLS: &str = "id, user_id, date, time, content, created_at, updated_at";
const GOAL_COLS: &str =
    "id, user_id, title, description, target_value, target_date, is_active, created_at, updated_at";
const PROGRESS_COLS: &str =
    "id, goal_id, date, current_value, is_completed, notes, created_at, updated_at";

fn row_to_body_record(row: &Row) -> BodyRecord {
    BodyRecord {
        id: row.get("id"),
        user_id: row.get("user_id"),
        date: row.get("date"),
        weight: row.get("weight"),
        body_fat_percentage: row.get("body_fat_percentage"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn row_to_meal(row: &Row) -> VitaResult<Meal> {
    let meal_type: String = row.get("meal_type");
    let meal_type = meal_type.parse().map_err(|_| {
        VitaError::from(StorageError::QueryFailed {
            reason: format!("unexpected meal_type value '{}'", meal_type),
        })
    })?;
    Ok(Meal {
        id: row.get("id"),
        user_id: row.get("user_id"),
        date: row.get("date"),
        meal_type,
        description: row.get("description"),
        calories: row.get("calories"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn row_to_exercise(row: &Row) -> Exercise {
    Exercise {
        id: row.get("id"),
        user_id: row.get("user_id"),
        date: row.get("date"),
        name: row.get("name"),
        duration_min: row.get("duration_min"),
        calories: row.get("calories"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn row_to_diary(row: &Row) -> Diary {
    Diary {
        id: row.get("id"),
        user_id: row.get("user_id"),
        date: row.get("date"),
        time: row.get("time"),
        content: row.get("content"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn row_to_goal(row: &Row) -> Goal {
    Goal {
        id: row.get("id"),
        user_id: row.get("user_id"),
        title: row.get("title"),
        description: row.get("description"),
        target_value: row.get("target_value"),
        target_date: row.get("target_date"),
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn row_to_progress(row: &Row) -> GoalProgress {
    GoalProgress {
        id: row.get("id"),
        goal_id: row.get("goal_id"),
        date: row.get("date"),
        current_value: row.get("current_value"),
        is_completed: row.get("is_completed"),
        notes: row.get("notes"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

// ============================================================================
// STORE IMPLEMENTATION
// ============================================================================

#[async_trait]
impl Store for DbClient {
    // === User Operations ===

    async fn user_ids_page(&self, after_id: UserId, limit: i64) -> VitaResult<Vec<UserId>> {
        let conn = self.get_conn().await?;
        let rows = conn
            .query(
                "SELECT id FROM users WHERE id > $1 ORDER BY id ASC LIMIT $2",
                &[&after_id, &limit],
            )
            .await
            .map_err(query_err)?;
        Ok(rows.iter().map(|row| row.get(0)).collect())
    }

    // === Body Record Operations ===

    async fn body_record_insert(
        &self,
        user_id: UserId,
        new: &NewBodyRecord,
    ) -> VitaResult<BodyRecord> {
        let conn = self.get_conn().await?;
        let sql = format!(
            "INSERT INTO body_records (user_id, date, weight, body_fat_percentage) \
             VALUES ($1, $2, $3, $4) RETURNING {}",
            BODY_RECORD_COLS
        );
        let row = conn
            .query_one(
                sql.as_str(),
                &[&user_id, &new.date, &new.weight, &new.body_fat_percentage],
            )
            .await
            .map_err(query_err)?;
        Ok(row_to_body_record(&row))
    }

    async fn body_record_get(&self, id: RecordId) -> VitaResult<Option<BodyRecord>> {
        let conn = self.get_conn().await?;
        let sql = format!("SELECT {} FROM body_records WHERE id = $1", BODY_RECORD_COLS);
        let row = conn.query_opt(sql.as_str(), &[&id]).await.map_err(query_err)?;
        Ok(row.as_ref().map(row_to_body_record))
    }

    async fn body_record_update(
        &self,
        id: RecordId,
        update: &BodyRecordUpdate,
    ) -> VitaResult<BodyRecord> {
        let conn = self.get_conn().await?;
        let mut sets: Vec<String> = Vec::new();
        let mut params: Vec<SqlParam<'_>> = Vec::new();
        if let Some(date) = &update.date {
            params.push(date);
            sets.push(format!("date = ${}", params.len()));
        }
        if let Some(weight) = &update.weight {
            params.push(weight);
            sets.push(format!("weight = ${}", params.len()));
        }
        if let Some(body_fat) = &update.body_fat_percentage {
            params.push(body_fat);
            sets.push(format!("body_fat_percentage = ${}", params.len()));
        }
        sets.push("updated_at = now()".to_string());
        params.push(&id);
        let sql = format!(
            "UPDATE body_records SET {} WHERE id = ${} RETURNING {}",
            sets.join(", "),
            params.len(),
            BODY_RECORD_COLS
        );
        let row = conn
            .query_opt(sql.as_str(), &params)
            .await
            .map_err(query_err)?
            .ok_or_else(|| not_found(RecordKind::BodyRecord, id))?;
        Ok(row_to_body_record(&row))
    }

    async fn body_record_delete(&self, id: RecordId) -> VitaResult<()> {
        let conn = self.get_conn().await?;
        let deleted = conn
            .execute("DELETE FROM body_records WHERE id = $1", &[&id])
            .await
            .map_err(query_err)?;
        if deleted == 0 {
            return Err(not_found(RecordKind::BodyRecord, id));
        }
        Ok(())
    }

    async fn body_record_list(
        &self,
        user_id: UserId,
        filter: &DateRangeFilter,
        limit: Option<i64>,
        offset: i64,
    ) -> VitaResult<Vec<BodyRecord>> {
        let conn = self.get_conn().await?;
        let mut conditions = vec!["user_id = $1".to_string()];
        let mut params: Vec<SqlParam<'_>> = vec![&user_id];
        push_date_range(filter, &mut conditions, &mut params);
        let mut sql = format!(
            "SELECT {} FROM body_records WHERE {}",
            BODY_RECORD_COLS,
            conditions.join(" AND ")
        );
        push_page_clause(&mut sql, "date DESC, id DESC", &limit, &offset, &mut params);
        let rows = conn.query(sql.as_str(), &params).await.map_err(query_err)?;
        Ok(rows.iter().map(row_to_body_record).collect())
    }

    async fn body_record_count(
        &self,
        user_id: UserId,
        filter: &DateRangeFilter,
    ) -> VitaResult<i64> {
        let conn = self.get_conn().await?;
        let mut conditions = vec!["user_id = $1".to_string()];
        let mut params: Vec<SqlParam<'_>> = vec![&user_id];
        push_date_range(filter, &mut conditions, &mut params);
        let sql = format!(
            "SELECT COUNT(*) FROM body_records WHERE {}",
            conditions.join(" AND ")
        );
        let row = conn.query_one(sql.as_str(), &params).await.map_err(query_err)?;
        Ok(row.get(0))
    }

    // === Meal Operations ===

    async fn meal_insert(&self, user_id: UserId, new: &NewMeal) -> VitaResult<Meal> {
        let conn = self.get_conn().await?;
        let meal_type = new.meal_type.as_str();
        let sql = format!(
            "INSERT INTO meals (user_id, date, meal_type, description, calories) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            MEAL_COLS
        );
        let row = conn
            .query_one(
                sql.as_str(),
                &[
                    &user_id,
                    &new.date,
                    &meal_type,
                    &new.description,
                    &new.calories,
                ],
            )
            .await
            .map_err(query_err)?;
        row_to_meal(&row)
    }

    async fn meal_get(&self, id: RecordId) -> VitaResult<Option<Meal>> {
        let conn = self.get_conn().await?;
        let sql = format!("SELECT {} FROM meals WHERE id = $1", MEAL_COLS);
        let row = conn.query_opt(sql.as_str(), &[&id]).await.map_err(query_err)?;
        row.as_ref().map(row_to_meal).transpose()
    }

    async fn meal_update(&self, id: RecordId, update: &MealUpdate) -> VitaResult<Meal> {
        let conn = self.get_conn().await?;
        let mut sets: Vec<String> = Vec::new();
        let mut params: Vec<SqlParam<'_>> = Vec::new();
        if let Some(date) = &update.date {
            params.push(date);
            sets.push(format!("date = ${}", params.len()));
        }
        let meal_type = update.meal_type.map(|t| t.as_str());
        if let Some(meal_type) = &meal_type {
            params.push(meal_type);
            sets.push(format!("meal_type = ${}", params.len()));
        }
        if let Some(description) = &update.description {
            params.push(description);
            sets.push(format!("description = ${}", params.len()));
        }
        if let Some(calories) = &update.calories {
            params.push(calories);
            sets.push(format!("calories = ${}", params.len()));
        }
        sets.push("updated_at = now()".to_string());
        params.push(&id);
        let sql = format!(
            "UPDATE meals SET {} WHERE id = ${} RETURNING {}",
            sets.join(", "),
            params.len(),
            MEAL_COLS
        );
        let row = conn
            .query_opt(sql.as_str(), &params)
            .await
            .map_err(query_err)?
            .ok_or_else(|| not_found(RecordKind::Meal, id))?;
        row_to_meal(&row)
    }

    async fn meal_delete(&self, id: RecordId) -> VitaResult<()> {
        let conn = self.get_conn().await?;
        let deleted = conn
            .execute("DELETE FROM meals WHERE id = $1", &[&id])
            .await
            .map_err(query_err)?;
        if deleted == 0 {
            return Err(not_found(RecordKind::Meal, id));
        }
        Ok(())
    }

    async fn meal_list(
        &self,
        user_id: UserId,
        filter: &MealFilter,
        limit: Option<i64>,
        offset: i64,
    ) -> VitaResult<Vec<Meal>> {
        let conn = self.get_conn().await?;
        let range = filter.range();
        let mut conditions = vec!["user_id = $1".to_string()];
        let mut params: Vec<SqlParam<'_>> = vec![&user_id];
        push_date_range(&range, &mut conditions, &mut params);
        let meal_type = filter.meal_type.map(|t| t.as_str());
        if let Some(meal_type) = &meal_type {
            params.push(meal_type);
            conditions.push(format!("meal_type = ${}", params.len()));
        }
        let mut sql = format!(
            "SELECT {} FROM meals WHERE {}",
            MEAL_COLS,
            conditions.join(" AND ")
        );
        push_page_clause(&mut sql, "date DESC, id DESC", &limit, &offset, &mut params);
        let rows = conn.query(sql.as_str(), &params).await.map_err(query_err)?;
        rows.iter().map(row_to_meal).collect()
    }

    async fn meal_count(&self, user_id: UserId, filter: &MealFilter) -> VitaResult<i64> {
        let conn = self.get_conn().await?;
        let range = filter.range();
        let mut conditions = vec!["user_id = $1".to_string()];
        let mut params: Vec<SqlParam<'_>> = vec![&user_id];
        push_date_range(&range, &mut conditions, &mut params);
        let meal_type = filter.meal_type.map(|t| t.as_str());
        if let Some(meal_type) = &meal_type {
            params.push(meal_type);
            conditions.push(format!("meal_type = ${}", params.len()));
        }
        let sql = format!("SELECT COUNT(*) FROM meals WHERE {}", conditions.join(" AND "));
        let row = conn.query_one(sql.as_str(), &params).await.map_err(query_err)?;
        Ok(row.get(0))
    }

    // === Exercise Operations ===

    async fn exercise_insert(&self, user_id: UserId, new: &NewExercise) -> VitaResult<Exercise> {
        let conn = self.get_conn().await?;
        let sql = format!(
            "INSERT INTO exercises (user_id, date, name, duration_min, calories) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            EXERCISE_COLS
        );
        let row = conn
            .query_one(
                sql.as_str(),
                &[
                    &user_id,
                    &new.date,
                    &new.name,
                    &new.duration_min,
                    &new.calories,
                ],
            )
            .await
            .map_err(query_err)?;
        Ok(row_to_exercise(&row))
    }

    async fn exercise_get(&self, id: RecordId) -> VitaResult<Option<Exercise>> {
        let conn = self.get_conn().await?;
        let sql = format!("SELECT {} FROM exercises WHERE id = $1", EXERCISE_COLS);
        let row = conn.query_opt(sql.as_str(), &[&id]).await.map_err(query_err)?;
        Ok(row.as_ref().map(row_to_exercise))
    }

    async fn exercise_update(
        &self,
        id: RecordId,
        update: &ExerciseUpdate,
    ) -> VitaResult<Exercise> {
        let conn = self.get_conn().await?;
        let mut sets: Vec<String> = Vec::new();
        let mut params: Vec<SqlParam<'_>> = Vec::new();
        if let Some(date) = &update.date {
            params.push(date);
            sets.push(format!("date = ${}", params.len()));
        }
        if let Some(name) = &update.name {
            params.push(name);
            sets.push(format!("name = ${}", params.len()));
        }
        if let Some(duration_min) = &update.duration_min {
            params.push(duration_min);
            sets.push(format!("duration_min = ${}", params.len()));
        }
        if let Some(calories) = &update.calories {
            params.push(calories);
            sets.push(format!("calories = ${}", params.len()));
        }
        sets.push("updated_at = now()".to_string());
        params.push(&id);
        let sql = format!(
            "UPDATE exercises SET {} WHERE id = ${} RETURNING {}",
            sets.join(", "),
            params.len(),
            EXERCISE_COLS
        );
        let row = conn
            .query_opt(sql.as_str(), &params)
            .await
            .map_err(query_err)?
            .ok_or_else(|| not_found(RecordKind::Exercise, id))?;
        Ok(row_to_exercise(&row))
    }

    async fn exercise_delete(&self, id: RecordId) -> VitaResult<()> {
        let conn = self.get_conn().await?;
        let deleted = conn
            .execute("DELETE FROM exercises WHERE id = $1", &[&id])
            .await
            .map_err(query_err)?;
        if deleted == 0 {
            return Err(not_found(RecordKind::Exercise, id));
        }
        Ok(())
    }

    async fn exercise_list(
        &self,
        user_id: UserId,
        filter: &DateRangeFilter,
        limit: Option<i64>,
        offset: i64,
    ) -> VitaResult<Vec<Exercise>> {
        let conn = self.get_conn().await?;
        let mut conditions = vec!["user_id = $1".to_string()];
        let mut params: Vec<SqlParam<'_>> = vec![&user_id];
        push_date_range(filter, &mut conditions, &mut params);
        let mut sql = format!(
            "SELECT {} FROM exercises WHERE {}",
            EXERCISE_COLS,
            conditions.join(" AND ")
        );
        push_page_clause(&mut sql, "date DESC, id DESC", &limit, &offset, &mut params);
        let rows = conn.query(sql.as_str(), &params).await.map_err(query_err)?;
        Ok(rows.iter().map(row_to_exercise).collect())
    }

    async fn exercise_count(
        &self,
        user_id: UserId,
        filter: &DateRangeFilter,
    ) -> VitaResult<i64> {
        let conn = self.get_conn().await?;
        let mut conditions = vec!["user_id = $1".to_string()];
        let mut params: Vec<SqlParam<'_>> = vec![&user_id];
        push_date_range(filter, &mut conditions, &mut params);
        let sql = format!(
            "SELECT COUNT(*) FROM exercises WHERE {}",
            conditions.join(" AND ")
        );
        let row = conn.query_one(sql.as_str(), &params).await.map_err(query_err)?;
        Ok(row.get(0))
    }

    // === Diary Operations ===

    async fn diary_insert(&self, user_id: UserId, new: &NewDiary) -> VitaResult<Diary> {
        let conn = self.get_conn().await?;
        let sql = format!(
            "INSERT INTO diaries (user_id, date, time, content) \
             VALUES ($1, $2, $3, $4) RETURNING {}",
            DIARY_COLS
        );
        let row = conn
            .query_one(sql.as_str(), &[&user_id, &new.date, &new.time, &new.content])
            .await
            .map_err(query_err)?;
        Ok(row_to_diary(&row))
    }

    async fn diary_get(&self, id: RecordId) -> VitaResult<Option<Diary>> {
        let conn = self.get_conn().await?;
        let sql = format!("SELECT {} FROM diaries WHERE id = $1", DIARY_COLS);
        let row = conn.query_opt(sql.as_str(), &[&id]).await.map_err(query_err)?;
        Ok(row.as_ref().map(row_to_diary))
    }

    async fn diary_update(&self, id: RecordId, update: &DiaryUpdate) -> VitaResult<Diary> {
        let conn = self.get_conn().await?;
        let mut sets: Vec<String> = Vec::new();
        let mut params: Vec<SqlParam<'_>> = Vec::new();
        if let Some(date) = &update.date {
            params.push(date);
            sets.push(format!("date = ${}", params.len()));
        }
        if let Some(time) = &update.time {
            params.push(time);
            sets.push(format!("time = ${}", params.len()));
        }
        if let Some(content) = &update.content {
            params.push(content);
            sets.push(format!("content = ${}", params.len()));
        }
        sets.push("updated_at = now()".to_string());
        params.push(&id);
        let sql = format!(
            "UPDATE diaries SET {} WHERE id = ${} RETURNING {}",
            sets.join(", "),
            params.len(),
            DIARY_COLS
        );
        let row = conn
            .query_opt(sql.as_str(), &params)
            .await
            .map_err(query_err)?
            .ok_or_else(|| not_found(RecordKind::Diary, id))?;
        Ok(row_to_diary(&row))
    }

    async fn diary_delete(&self, id: RecordId) -> VitaResult<()> {
        let conn = self.get_conn().await?;
        let deleted = conn
            .execute("DELETE FROM diaries WHERE id = $1", &[&id])
            .await
            .map_err(query_err)?;
        if deleted == 0 {
            return Err(not_found(RecordKind::Diary, id));
        }
        Ok(())
    }

    async fn diary_list(
        &self,
        user_id: UserId,
        filter: &DateRangeFilter,
        limit: Option<i64>,
        offset: i64,
    ) -> VitaResult<Vec<Diary>> {
        let conn = self.get_conn().await?;
        let mut conditions = vec!["user_id = $1".to_string()];
        let mut params: Vec<SqlParam<'_>> = vec![&user_id];
        push_date_range(filter, &mut conditions, &mut params);
        let mut sql = format!(
            "SELECT {} FROM diaries WHERE {}",
            DIARY_COLS,
            conditions.join(" AND ")
        );
        push_page_clause(&mut sql, "date DESC, id DESC", &limit, &offset, &mut params);
        let rows = conn.query(sql.as_str(), &params).await.map_err(query_err)?;
        Ok(rows.iter().map(row_to_diary).collect())
    }

    async fn diary_count(&self, user_id: UserId, filter: &DateRangeFilter) -> VitaResult<i64> {
        let conn = self.get_conn().await?;
        let mut conditions = vec!["user_id = $1".to_string()];
        let mut params: Vec<SqlParam<'_>> = vec![&user_id];
        push_date_range(filter, &mut conditions, &mut params);
        let sql = format!(
            "SELECT COUNT(*) FROM diaries WHERE {}",
            conditions.join(" AND ")
        );
        let row = conn.query_one(sql.as_str(), &params).await.map_err(query_err)?;
        Ok(row.get(0))
    }

    // === Goal Operations ===

    async fn goal_insert(&self, user_id: UserId, new: &NewGoal) -> VitaResult<Goal> {
        let conn = self.get_conn().await?;
        let sql = format!(
            "INSERT INTO goals (user_id, title, description, target_value, target_date, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            GOAL_COLS
        );
        let row = conn
            .query_one(
                sql.as_str(),
                &[
                    &user_id,
                    &new.title,
                    &new.description,
                    &new.target_value,
                    &new.target_date,
                    &new.is_active,
                ],
            )
            .await
            .map_err(query_err)?;
        Ok(row_to_goal(&row))
    }

    async fn goal_get(&self, id: GoalId) -> VitaResult<Option<Goal>> {
        let conn = self.get_conn().await?;
        let sql = format!("SELECT {} FROM goals WHERE id = $1", GOAL_COLS);
        let row = conn.query_opt(sql.as_str(), &[&id]).await.map_err(query_err)?;
        Ok(row.as_ref().map(row_to_goal))
    }

    async fn goal_update(&self, id: GoalId, update: &GoalUpdate) -> VitaResult<Goal> {
        let conn = self.get_conn().await?;
        let mut sets: Vec<String> = Vec::new();
        let mut params: Vec<SqlParam<'_>> = Vec::new();
        if let Some(title) = &update.title {
            params.push(title);
            sets.push(format!("title = ${}", params.len()));
        }
        if let Some(description) = &update.description {
            params.push(description);
            sets.push(format!("description = ${}", params.len()));
        }
        if let Some(target_value) = &update.target_value {
            params.push(target_value);
            sets.push(format!("target_value = ${}", params.len()));
        }
        if let Some(target_date) = &update.target_date {
            params.push(target_date);
            sets.push(format!("target_date = ${}", params.len()));
        }
        if let Some(is_active) = &update.is_active {
            params.push(is_active);
            sets.push(format!("is_active = ${}", params.len()));
        }
        sets.push("updated_at = now()".to_string());
        params.push(&id);
        let sql = format!(
            "UPDATE goals SET {} WHERE id = ${} RETURNING {}",
            sets.join(", "),
            params.len(),
            GOAL_COLS
        );
        let row = conn
            .query_opt(sql.as_str(), &params)
            .await
            .map_err(query_err)?
            .ok_or_else(|| not_found(RecordKind::Goal, id))?;
        Ok(row_to_goal(&row))
    }

    async fn goal_delete(&self, id: GoalId) -> VitaResult<()> {
        let conn = self.get_conn().await?;
        // Progress entries go with the goal via ON DELETE CASCADE.
        let deleted = conn
            .execute("DELETE FROM goals WHERE id = $1", &[&id])
            .await
            .map_err(query_err)?;
        if deleted == 0 {
            return Err(not_found(RecordKind::Goal, id));
        }
        Ok(())
    }

    async fn goal_list(
        &self,
        user_id: UserId,
        filter: &GoalFilter,
        limit: Option<i64>,
        offset: i64,
    ) -> VitaResult<Vec<Goal>> {
        let conn = self.get_conn().await?;
        let mut conditions = vec!["user_id = $1".to_string()];
        let mut params: Vec<SqlParam<'_>> = vec![&user_id];
        if let Some(is_active) = &filter.is_active {
            params.push(is_active);
            conditions.push(format!("is_active = ${}", params.len()));
        }
        let mut sql = format!(
            "SELECT {} FROM goals WHERE {}",
            GOAL_COLS,
            conditions.join(" AND ")
        );
        push_page_clause(
            &mut sql,
            "created_at DESC, id DESC",
            &limit,
            &offset,
            &mut params,
        );
        let rows = conn.query(sql.as_str(), &params).await.map_err(query_err)?;
        Ok(rows.iter().map(row_to_goal).collect())
    }

    async fn goal_count(&self, user_id: UserId, filter: &GoalFilter) -> VitaResult<i64> {
        let conn = self.get_conn().await?;
        let mut conditions = vec!["user_id = $1".to_string()];
        let mut params: Vec<SqlParam<'_>> = vec![&user_id];
        if let Some(is_active) = &filter.is_active {
            params.push(is_active);
            conditions.push(format!("is_active = ${}", params.len()));
        }
        let sql = format!("SELECT COUNT(*) FROM goals WHERE {}", conditions.join(" AND "));
        let row = conn.query_one(sql.as_str(), &params).await.map_err(query_err)?;
        Ok(row.get(0))
    }

    // === Goal Progress Operations ===

    async fn goal_progress_insert(
        &self,
        goal_id: GoalId,
        new: &NewGoalProgress,
    ) -> VitaResult<GoalProgress> {
        let conn = self.get_conn().await?;
        let sql = format!(
            "INSERT INTO goal_progress (goal_id, date, current_value, is_completed, notes) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            PROGRESS_COLS
        );
        let row = conn
            .query_one(
                sql.as_str(),
                &[
                    &goal_id,
                    &new.date,
                    &new.current_value,
                    &new.is_completed,
                    &new.notes,
                ],
            )
            .await
            .map_err(query_err)?;
        Ok(row_to_progress(&row))
    }

    async fn goal_progress_get(&self, id: RecordId) -> VitaResult<Option<GoalProgress>> {
        let conn = self.get_conn().await?;
        let sql = format!("SELECT {} FROM goal_progress WHERE id = $1", PROGRESS_COLS);
        let row = conn.query_opt(sql.as_str(), &[&id]).await.map_err(query_err)?;
        Ok(row.as_ref().map(row_to_progress))
    }

    async fn goal_progress_update(
        &self,
        id: RecordId,
        update: &GoalProgressUpdate,
    ) -> VitaResult<GoalProgress> {
        let conn = self.get_conn().await?;
        let mut sets: Vec<String> = Vec::new();
        let mut params: Vec<SqlParam<'_>> = Vec::new();
        if let Some(date) = &update.date {
            params.push(date);
            sets.push(format!("date = ${}", params.len()));
        }
        if let Some(current_value) = &update.current_value {
            params.push(current_value);
            sets.push(format!("current_value = ${}", params.len()));
        }
        if let Some(is_completed) = &update.is_completed {
            params.push(is_completed);
            sets.push(format!("is_completed = ${}", params.len()));
        }
        if let Some(notes) = &update.notes {
            params.push(notes);
            sets.push(format!("notes = ${}", params.len()));
        }
        sets.push("updated_at = now()".to_string());
        params.push(&id);
        let sql = format!(
            "UPDATE goal_progress SET {} WHERE id = ${} RETURNING {}",
            sets.join(", "),
            params.len(),
            PROGRESS_COLS
        );
        let row = conn
            .query_opt(sql.as_str(), &params)
            .await
            .map_err(query_err)?
            .ok_or_else(|| not_found(RecordKind::GoalProgress, id))?;
        Ok(row_to_progress(&row))
    }

    async fn goal_progress_delete(&self, id: RecordId) -> VitaResult<()> {
        let conn = self.get_conn().await?;
        let deleted = conn
            .execute("DELETE FROM goal_progress WHERE id = $1", &[&id])
            .await
            .map_err(query_err)?;
        if deleted == 0 {
            return Err(not_found(RecordKind::GoalProgress, id));
        }
        Ok(())
    }

    async fn goal_progress_list(
        &self,
        goal_id: GoalId,
        filter: &DateRangeFilter,
        limit: Option<i64>,
        offset: i64,
    ) -> VitaResult<Vec<GoalProgress>> {
        let conn = self.get_conn().await?;
        let mut conditions = vec!["goal_id = $1".to_string()];
        let mut params: Vec<SqlParam<'_>> = vec![&goal_id];
        push_date_range(filter, &mut conditions, &mut params);
        let mut sql = format!(
            "SELECT {} FROM goal_progress WHERE {}",
            PROGRESS_COLS,
            conditions.join(" AND ")
        );
        push_page_clause(&mut sql, "date DESC, id DESC", &limit, &offset, &mut params);
        let rows = conn.query(sql.as_str(), &params).await.map_err(query_err)?;
        Ok(rows.iter().map(row_to_progress).collect())
    }

    async fn goal_progress_count(
        &self,
        goal_id: GoalId,
        filter: &DateRangeFilter,
    ) -> VitaResult<i64> {
        let conn = self.get_conn().await?;
        let mut conditions = vec!["goal_id = $1".to_string()];
        let mut params: Vec<SqlParam<'_>> = vec![&goal_id];
        push_date_range(filter, &mut conditions, &mut params);
        let sql = format!(
            "SELECT COUNT(*) FROM goal_progress WHERE {}",
            conditions.join(" AND ")
        );
        let row = conn.query_one(sql.as_str(), &params).await.map_err(query_err)?;
        Ok(row.get(0))
    }

    // === Aggregate Queries ===

    async fn count_completed_goals(
        &self,
        user_id: UserId,
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> VitaResult<i64> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_one(
                "SELECT COUNT(DISTINCT gp.goal_id) \
                 FROM goal_progress gp \
                 JOIN goals g ON g.id = gp.goal_id \
                 WHERE g.user_id = $1 AND gp.is_completed \
                   AND gp.date >= $2 AND gp.date <= $3",
                &[&user_id, &date_from, &date_to],
            )
            .await
            .map_err(query_err)?;
        Ok(row.get(0))
    }

    async fn count_active_goals(&self, user_id: UserId) -> VitaResult<i64> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_one(
                "SELECT COUNT(*) FROM goals WHERE user_id = $1 AND is_active",
                &[&user_id],
            )
            .await
            .map_err(query_err)?;
        Ok(row.get(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = DbConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 5432);
        assert_eq!(config.dbname, "vita");
        assert_eq!(config.max_size, 16);
    }

    #[test]
    fn test_push_date_range_numbers_params() {
        let user_id: UserId = 1;
        let filter = DateRangeFilter::new(
            Some("2026-08-01".parse().unwrap()),
            Some("2026-08-31".parse().unwrap()),
        );
        let mut conditions = vec!["user_id = $1".to_string()];
        let mut params: Vec<SqlParam<'_>> = vec![&user_id];
        push_date_range(&filter, &mut conditions, &mut params);
        assert_eq!(
            conditions,
            vec![
                "user_id = $1".to_string(),
                "date >= $2".to_string(),
                "date <= $3".to_string()
            ]
        );
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn test_push_page_clause_with_and_without_limit() {
        let user_id: UserId = 1;
        let offset: i64 = 20;

        let limit = Some(10i64);
        let mut sql = "SELECT 1".to_string();
        let mut params: Vec<SqlParam<'_>> = vec![&user_id];
        push_page_clause(&mut sql, "date DESC, id DESC", &limit, &offset, &mut params);
        assert_eq!(sql, "SELECT 1 ORDER BY date DESC, id DESC LIMIT $2 OFFSET $3");

        let no_limit: Option<i64> = None;
        let mut sql = "SELECT 1".to_string();
        let mut params: Vec<SqlParam<'_>> = vec![&user_id];
        push_page_clause(&mut sql, "date DESC, id DESC", &no_limit, &offset, &mut params);
        assert_eq!(sql, "SELECT 1 ORDER BY date DESC, id DESC OFFSET $2");
    }
}
