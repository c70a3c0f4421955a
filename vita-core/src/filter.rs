//! Kind-specific list filters.
//!
//! Each record kind exposes a small filter struct used by both the storage
//! trait (SQL WHERE clauses) and the in-memory store (predicate matching).
//! All fields are optional; an empty filter matches everything the owner has.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::enums::MealType;
use crate::GoalId;

/// Inclusive date-range filter shared by body records, exercises, diaries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DateRangeFilter {
    #[serde(default)]
    pub date_from: Option<NaiveDate>,
    #[serde(default)]
    pub date_to: Option<NaiveDate>,
}

impl DateRangeFilter {
    pub fn new(date_from: Option<NaiveDate>, date_to: Option<NaiveDate>) -> Self {
        Self { date_from, date_to }
    }

    /// Whether `date` falls inside the (possibly open-ended) range.
    pub fn contains(&self, date: NaiveDate) -> bool {
        if let Some(from) = self.date_from {
            if date < from {
                return false;
            }
        }
        if let Some(to) = self.date_to {
            if date > to {
                return false;
            }
        }
        true
    }
}

/// Filter for meals: date range plus optional meal type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MealFilter {
    #[serde(default)]
    pub date_from: Option<NaiveDate>,
    #[serde(default)]
    pub date_to: Option<NaiveDate>,
    #[serde(default)]
    pub meal_type: Option<MealType>,
}

impl MealFilter {
    pub fn range(&self) -> DateRangeFilter {
        DateRangeFilter::new(self.date_from, self.date_to)
    }
}

/// Filter for goals: optional active flag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct GoalFilter {
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Filter for goal-progress entries: the parent goal plus a date range.
/// `goal_id` comes from the request path, not the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct GoalProgressFilter {
    pub goal_id: GoalId,
    #[serde(default)]
    pub date_from: Option<NaiveDate>,
    #[serde(default)]
    pub date_to: Option<NaiveDate>,
}

impl GoalProgressFilter {
    pub fn for_goal(goal_id: GoalId) -> Self {
        Self {
            goal_id,
            ..Default::default()
        }
    }

    pub fn range(&self) -> DateRangeFilter {
        DateRangeFilter::new(self.date_from, self.date_to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_empty_range_matches_everything() {
        let filter = DateRangeFilter::default();
        assert!(filter.contains(d("1970-01-01")));
        assert!(filter.contains(d("2100-12-31")));
    }

    #[test]
    fn test_range_bounds_are_inclusive() {
        let filter = DateRangeFilter::new(Some(d("2026-08-01")), Some(d("2026-08-31")));
        assert!(filter.contains(d("2026-08-01")));
        assert!(filter.contains(d("2026-08-31")));
        assert!(!filter.contains(d("2026-07-31")));
        assert!(!filter.contains(d("2026-09-01")));
    }

    #[test]
    fn test_open_ended_range() {
        let from_only = DateRangeFilter::new(Some(d("2026-08-01")), None);
        assert!(from_only.contains(d("2030-01-01")));
        assert!(!from_only.contains(d("2026-07-01")));

        let to_only = DateRangeFilter::new(None, Some(d("2026-08-01")));
        assert!(to_only.contains(d("2020-01-01")));
        assert!(!to_only.contains(d("2026-08-02")));
    }

    #[test]
    fn test_goal_progress_filter_for_goal() {
        let filter = GoalProgressFilter::for_goal(9);
        assert_eq!(filter.goal_id, 9);
        assert!(filter.date_from.is_none());
    }
}
