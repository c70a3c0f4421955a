//! Achievement-rate statistic types and window arithmetic.
//!
//! The statistic itself is ephemeral: it is always reconstructible from the
//! store, and the cached copy is a pure optimization.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::UserId;

/// Default trailing window in days.
pub const DEFAULT_WINDOW_DAYS: i32 = 30;

/// Smallest accepted window.
pub const MIN_WINDOW_DAYS: i32 = 1;

/// Largest accepted window.
pub const MAX_WINDOW_DAYS: i32 = 365;

/// Fixed TTL for cached achievement-rate entries, in seconds.
pub const ACHIEVEMENT_RATE_TTL_SECS: u64 = 3600;

/// Cache key for a user's achievement-rate entry.
pub fn achievement_rate_cache_key(user_id: UserId) -> String {
    format!("achievement_rate:{}", user_id)
}

/// Inclusive window of exactly `window_days` calendar days ending at `today`.
///
/// `window_days` must already be validated into `1..=365`.
pub fn window_bounds(today: NaiveDate, window_days: i32) -> (NaiveDate, NaiveDate) {
    let start = today
        .checked_sub_days(Days::new((window_days - 1) as u64))
        .unwrap_or(NaiveDate::MIN);
    (start, today)
}

/// Computed achievement-rate payload. This is exactly the shape written to
/// and read from the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AchievementStat {
    /// Percentage in [0.0, 100.0], rounded to two decimal places.
    pub value: f64,
    /// Window the statistic was computed for.
    pub window_days: i32,
    /// Distinct goals with at least one completed progress entry in window.
    pub completed_goals: i64,
    /// Currently-active goals (window-independent denominator).
    pub total_goals: i64,
}

impl AchievementStat {
    /// Build the statistic from raw counts, applying the product formula:
    /// zero when there are no active goals, otherwise the clamped, rounded
    /// completion percentage.
    pub fn from_counts(completed_goals: i64, total_goals: i64, window_days: i32) -> Self {
        let value = if total_goals == 0 {
            0.0
        } else {
            let raw = completed_goals as f64 / total_goals as f64 * 100.0;
            (raw.clamp(0.0, 100.0) * 100.0).round() / 100.0
        };
        Self {
            value,
            window_days,
            completed_goals,
            total_goals,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_zero_goals_is_zero_rate() {
        let stat = AchievementStat::from_counts(0, 0, 30);
        assert_eq!(stat.value, 0.0);
        assert_eq!(stat.total_goals, 0);

        // Orphan completed counts never divide by zero.
        let stat = AchievementStat::from_counts(5, 0, 30);
        assert_eq!(stat.value, 0.0);
    }

    #[test]
    fn test_half_completed() {
        let stat = AchievementStat::from_counts(2, 4, 30);
        assert_eq!(stat.value, 50.0);
        assert_eq!(stat.completed_goals, 2);
        assert_eq!(stat.total_goals, 4);
    }

    #[test]
    fn test_rounding_two_decimals() {
        // 1/3 -> 33.333... -> 33.33
        let stat = AchievementStat::from_counts(1, 3, 30);
        assert_eq!(stat.value, 33.33);
        // 2/3 -> 66.666... -> 66.67
        let stat = AchievementStat::from_counts(2, 3, 30);
        assert_eq!(stat.value, 66.67);
    }

    #[test]
    fn test_clamped_at_100() {
        // More completed than active goals can occur when goals were
        // deactivated after completion; the rate is capped.
        let stat = AchievementStat::from_counts(7, 4, 30);
        assert_eq!(stat.value, 100.0);
    }

    #[test]
    fn test_window_bounds_inclusive() {
        let (start, end) = window_bounds(d("2026-08-07"), 30);
        assert_eq!(end, d("2026-08-07"));
        assert_eq!(start, d("2026-07-09"));
        // Exactly 30 calendar days.
        assert_eq!((end - start).num_days(), 29);
    }

    #[test]
    fn test_window_of_one_day() {
        let today = d("2026-08-07");
        let (start, end) = window_bounds(today, 1);
        assert_eq!(start, end);
        assert_eq!(start, today);
    }

    #[test]
    fn test_cache_key_format() {
        assert_eq!(achievement_rate_cache_key(42), "achievement_rate:42");
    }

    proptest! {
        #[test]
        fn prop_rate_always_in_bounds(completed in 0i64..10_000, total in 0i64..10_000) {
            let stat = AchievementStat::from_counts(completed, total, 30);
            prop_assert!(stat.value >= 0.0);
            prop_assert!(stat.value <= 100.0);
            // Rounded to two decimals exactly.
            let scaled = stat.value * 100.0;
            prop_assert!((scaled - scaled.round()).abs() < 1e-9);
        }

        #[test]
        fn prop_window_length(days in 1i32..=365) {
            let (start, end) = window_bounds(d("2026-08-07"), days);
            prop_assert_eq!((end - start).num_days(), (days - 1) as i64);
        }
    }
}
