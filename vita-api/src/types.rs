//! Request and response DTOs for the REST layer.
//!
//! Entity and payload shapes come straight from `vita-core`; this module
//! adds the HTTP envelopes (pagination, stats responses) and query-string
//! parameter structs.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use vita_core::{AchievementStat, MealType, UserId};
use vita_storage::Page;

// ============================================================================
// PAGINATION ENVELOPE
// ============================================================================

/// Paginated list response.
///
/// `previous`/`next` are relative query-string cursors (empty when there is
/// no adjacent page); `count` is the total number of matching records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pagination<T> {
    pub data: Vec<T>,
    pub count: i64,
    pub previous: String,
    pub next: String,
}

impl<T> From<Page<T>> for Pagination<T> {
    fn from(page: Page<T>) -> Self {
        Self {
            data: page.items,
            count: page.total,
            previous: page.previous,
            next: page.next,
        }
    }
}

// ============================================================================
// QUERY PARAMETERS
// ============================================================================

/// Pagination plus date-range filters, shared by body records, exercises,
/// diaries, and goal progress listings.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecordPageQuery {
    /// Page size, 1..=100 (default 10).
    pub limit: Option<i64>,
    /// Rows to skip (default 0).
    pub offset: Option<i64>,
    /// Inclusive lower date bound, `YYYY-MM-DD`.
    pub date_from: Option<chrono::NaiveDate>,
    /// Inclusive upper date bound, `YYYY-MM-DD`.
    pub date_to: Option<chrono::NaiveDate>,
}

/// Meal listing parameters: pagination, date range, and meal type.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MealPageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub date_from: Option<chrono::NaiveDate>,
    pub date_to: Option<chrono::NaiveDate>,
    pub meal_type: Option<MealType>,
}

/// Goal listing parameters.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GoalPageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    /// Filter by active flag; absent returns both.
    pub is_active: Option<bool>,
}

/// Achievement-rate read parameters.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StatsQuery {
    /// Trailing window in days, 1..=365 (default 30).
    pub window_days: Option<i32>,
}

/// Manual recomputation trigger parameters.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TriggerQuery {
    /// Specific user to recompute; absent enqueues the full sweep.
    pub user_id: Option<UserId>,
}

// ============================================================================
// STATS RESPONSES
// ============================================================================

/// Achievement-rate response payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AchievementRateResponse {
    /// Present only on the per-user admin read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    pub achievement_rate: f64,
    pub window_days: i32,
    pub completed_goals: i64,
    pub total_goals: i64,
    /// Whether this payload was served from cache.
    pub cached: bool,
}

impl AchievementRateResponse {
    pub fn new(stat: AchievementStat, cached: bool, user_id: Option<UserId>) -> Self {
        Self {
            user_id,
            achievement_rate: stat.value,
            window_days: stat.window_days,
            completed_goals: stat.completed_goals,
            total_goals: stat.total_goals,
            cached,
        }
    }
}

/// Response to a manual recomputation trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TriggerResponse {
    pub message: String,
    /// Queue-assigned job id; absent when the queue rejected the job.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<Uuid>,
}

// ============================================================================
// HEALTH
// ============================================================================

/// Liveness payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_from_page() {
        let page = Page {
            items: vec![1, 2, 3],
            total: 12,
            previous: String::new(),
            next: "?limit=3&offset=3".to_string(),
        };
        let pagination: Pagination<i32> = page.into();
        assert_eq!(pagination.count, 12);
        assert_eq!(pagination.data, vec![1, 2, 3]);
        assert_eq!(pagination.next, "?limit=3&offset=3");
    }

    #[test]
    fn test_achievement_rate_response_omits_absent_user_id() {
        let stat = AchievementStat::from_counts(2, 4, 30);
        let own = AchievementRateResponse::new(stat.clone(), true, None);
        let json = serde_json::to_string(&own).unwrap();
        assert!(!json.contains("user_id"));
        assert!(json.contains("\"cached\":true"));

        let admin = AchievementRateResponse::new(stat, false, Some(9));
        let json = serde_json::to_string(&admin).unwrap();
        assert!(json.contains("\"user_id\":9"));
    }
}
