//! Persisted entity shapes and their create/update payloads.
//!
//! Every user-owned record carries `user_id` (or reaches a user transitively
//! through its parent goal) plus `created_at`/`updated_at` timestamps managed
//! by the storage layer. Update payloads use `Option` fields: `None` means
//! "leave untouched", mirroring PATCH semantics end to end.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::MealType;
use crate::{GoalId, RecordId, UserId};

// ============================================================================
// USER
// ============================================================================

/// A registered user. Identity anchor for all owned records; created at
/// registration and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub nickname: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// BODY RECORD
// ============================================================================

/// Daily body measurement (weight, optional body fat percentage).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BodyRecord {
    pub id: RecordId,
    pub user_id: UserId,
    pub date: NaiveDate,
    pub weight: f64,
    pub body_fat_percentage: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for creating a body record. The owner is supplied separately by
/// the access layer, never taken from the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct NewBodyRecord {
    pub date: NaiveDate,
    pub weight: f64,
    #[serde(default)]
    pub body_fat_percentage: Option<f64>,
}

/// Partial update for a body record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BodyRecordUpdate {
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub body_fat_percentage: Option<f64>,
}

// ============================================================================
// MEAL
// ============================================================================

/// A logged meal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Meal {
    pub id: RecordId,
    pub user_id: UserId,
    pub date: NaiveDate,
    pub meal_type: MealType,
    pub description: Option<String>,
    pub calories: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct NewMeal {
    pub date: NaiveDate,
    pub meal_type: MealType,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub calories: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MealUpdate {
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub meal_type: Option<MealType>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub calories: Option<i32>,
}

// ============================================================================
// EXERCISE
// ============================================================================

/// A logged exercise session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Exercise {
    pub id: RecordId,
    pub user_id: UserId,
    pub date: NaiveDate,
    pub name: String,
    pub duration_min: i32,
    pub calories: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct NewExercise {
    pub date: NaiveDate,
    pub name: String,
    pub duration_min: i32,
    #[serde(default)]
    pub calories: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ExerciseUpdate {
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub duration_min: Option<i32>,
    #[serde(default)]
    pub calories: Option<i32>,
}

// ============================================================================
// DIARY
// ============================================================================

/// Free-text diary entry, optionally time-stamped within the day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Diary {
    pub id: RecordId,
    pub user_id: UserId,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct NewDiary {
    pub date: NaiveDate,
    #[serde(default)]
    pub time: Option<NaiveTime>,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DiaryUpdate {
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub time: Option<NaiveTime>,
    #[serde(default)]
    pub content: Option<String>,
}

// ============================================================================
// GOAL
// ============================================================================

/// A user goal. Active goals form the denominator of the achievement rate.
/// Deleting a goal cascades to its progress entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Goal {
    pub id: GoalId,
    pub user_id: UserId,
    pub title: String,
    pub description: Option<String>,
    pub target_value: Option<f64>,
    pub target_date: Option<NaiveDate>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct NewGoal {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub target_value: Option<f64>,
    #[serde(default)]
    pub target_date: Option<NaiveDate>,
    #[serde(default = "default_is_active")]
    pub is_active: bool,
}

fn default_is_active() -> bool {
    true
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct GoalUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub target_value: Option<f64>,
    #[serde(default)]
    pub target_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

// ============================================================================
// GOAL PROGRESS
// ============================================================================

/// A progress entry against a goal. Many per goal; multiple entries for the
/// same date are legal and counted independently. Ownership is transitive
/// through the parent goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct GoalProgress {
    pub id: RecordId,
    pub goal_id: GoalId,
    pub date: NaiveDate,
    pub current_value: Option<f64>,
    pub is_completed: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct NewGoalProgress {
    pub date: NaiveDate,
    #[serde(default)]
    pub current_value: Option<f64>,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct GoalProgressUpdate {
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub current_value: Option<f64>,
    #[serde(default)]
    pub is_completed: Option<bool>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_goal_defaults_active() {
        let goal: NewGoal = serde_json::from_str(r#"{"title": "Run 5k"}"#).unwrap();
        assert!(goal.is_active);
        assert!(goal.description.is_none());
    }

    #[test]
    fn test_body_record_update_absent_fields_are_none() {
        let patch: BodyRecordUpdate = serde_json::from_str(r#"{"weight": 69.9}"#).unwrap();
        assert_eq!(patch.weight, Some(69.9));
        assert!(patch.date.is_none());
        assert!(patch.body_fat_percentage.is_none());
    }

    #[test]
    fn test_new_goal_progress_defaults() {
        let progress: NewGoalProgress =
            serde_json::from_str(r#"{"date": "2026-08-01"}"#).unwrap();
        assert!(!progress.is_completed);
        assert!(progress.current_value.is_none());
    }

    #[test]
    fn test_meal_serde_round_trip() {
        let meal = Meal {
            id: 7,
            user_id: 3,
            date: NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
            meal_type: MealType::Dinner,
            description: Some("salmon".to_string()),
            calories: Some(560),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        let json = serde_json::to_string(&meal).unwrap();
        let back: Meal = serde_json::from_str(&json).unwrap();
        assert_eq!(back, meal);
    }
}
