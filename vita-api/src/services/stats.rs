//! Achievement-rate engine.
//!
//! Computes the goal-completion percentage over a trailing window, memoizes
//! it in the cache with a fixed TTL, and serves reads cache-first. The
//! statistic is advisory: concurrent recomputations for the same user are
//! tolerated and the last cache write wins. No lock is held across any
//! store or cache call.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};

use vita_core::{
    achievement_rate_cache_key, window_bounds, AchievementStat, UserId, VitaResult,
    ACHIEVEMENT_RATE_TTL_SECS,
};
use vita_storage::{Cache, Store};

/// Result of a cache-first stat read.
#[derive(Debug, Clone, PartialEq)]
pub struct StatRead {
    pub stat: AchievementStat,
    /// Whether the payload came from the cache.
    pub cached: bool,
}

/// Computes, caches, and serves the achievement-rate statistic.
#[derive(Clone)]
pub struct StatsEngine {
    store: Arc<dyn Store>,
    cache: Arc<dyn Cache>,
}

impl StatsEngine {
    pub fn new(store: Arc<dyn Store>, cache: Arc<dyn Cache>) -> Self {
        Self { store, cache }
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Compute the statistic for today's trailing window and write it
    /// through to the cache.
    pub async fn compute(&self, user_id: UserId, window_days: i32) -> VitaResult<AchievementStat> {
        self.compute_at(user_id, window_days, Utc::now().date_naive())
            .await
    }

    /// Compute with an explicit window end. `window_days` must already be
    /// validated into 1..=365.
    pub async fn compute_at(
        &self,
        user_id: UserId,
        window_days: i32,
        today: NaiveDate,
    ) -> VitaResult<AchievementStat> {
        let (window_start, window_end) = window_bounds(today, window_days);

        let completed_goals = self
            .store
            .count_completed_goals(user_id, window_start, window_end)
            .await?;
        let total_goals = self.store.count_active_goals(user_id).await?;

        let stat = AchievementStat::from_counts(completed_goals, total_goals, window_days);

        // Write-through, unconditionally overwriting any prior entry. A
        // failed cache write must not fail the computation.
        match serde_json::to_value(&stat) {
            Ok(value) => {
                let key = achievement_rate_cache_key(user_id);
                let ttl = Duration::from_secs(ACHIEVEMENT_RATE_TTL_SECS);
                if let Err(err) = self.cache.set(&key, value, ttl).await {
                    tracing::warn!(user_id, error = %err, "Failed to cache achievement rate");
                }
            }
            Err(err) => {
                tracing::warn!(user_id, error = %err, "Failed to serialize achievement rate");
            }
        }

        tracing::debug!(
            user_id,
            window_days,
            completed_goals,
            total_goals,
            rate = stat.value,
            "Computed achievement rate"
        );

        Ok(stat)
    }

    /// Cache-first read. The cached payload is served only when its window
    /// matches the request; a mismatch, a miss, or any cache failure falls
    /// through to a fresh synchronous computation.
    pub async fn get(&self, user_id: UserId, window_days: i32) -> VitaResult<StatRead> {
        let key = achievement_rate_cache_key(user_id);
        match self.cache.get(&key).await {
            Ok(Some(value)) => match serde_json::from_value::<AchievementStat>(value) {
                Ok(stat) if stat.window_days == window_days => {
                    return Ok(StatRead { stat, cached: true });
                }
                Ok(stale) => {
                    tracing::debug!(
                        user_id,
                        cached_window = stale.window_days,
                        requested_window = window_days,
                        "Cached achievement rate is for a different window, recomputing"
                    );
                }
                Err(err) => {
                    tracing::warn!(user_id, error = %err, "Discarding undecodable cache entry");
                }
            },
            Ok(None) => {}
            Err(err) => {
                // Stat reads never fail outright on cache unavailability.
                tracing::warn!(user_id, error = %err, "Cache read failed, computing synchronously");
            }
        }

        let stat = self.compute(user_id, window_days).await?;
        Ok(StatRead {
            stat,
            cached: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use vita_core::DEFAULT_WINDOW_DAYS;
    use vita_test_utils::{date, store_with_goal_scenario, store_with_user, MemoryCache};

    fn engine(store: Arc<vita_test_utils::MemoryStore>) -> (StatsEngine, Arc<MemoryCache>) {
        let cache = Arc::new(MemoryCache::new());
        (StatsEngine::new(store, cache.clone()), cache)
    }

    #[tokio::test]
    async fn test_two_of_four_goals_is_fifty_percent() {
        let today = date("2026-08-07");
        let (store, user) = store_with_goal_scenario(4, 2, today).await;
        let (engine, _cache) = engine(store);

        let stat = engine
            .compute_at(user.id, DEFAULT_WINDOW_DAYS, today)
            .await
            .unwrap();
        assert_eq!(stat.value, 50.0);
        assert_eq!(stat.completed_goals, 2);
        assert_eq!(stat.total_goals, 4);
    }

    #[tokio::test]
    async fn test_no_goals_is_zero() {
        let (store, user) = store_with_user().await;
        let (engine, _cache) = engine(store);

        let stat = engine
            .compute_at(user.id, 30, date("2026-08-07"))
            .await
            .unwrap();
        assert_eq!(stat.value, 0.0);
        assert_eq!(stat.total_goals, 0);
        assert_eq!(stat.completed_goals, 0);
    }

    #[tokio::test]
    async fn test_compute_writes_through_to_cache() {
        let today = date("2026-08-07");
        let (store, user) = store_with_goal_scenario(4, 2, today).await;
        let (engine, cache) = engine(store);

        engine.compute_at(user.id, 30, today).await.unwrap();

        let key = achievement_rate_cache_key(user.id);
        let cached = cache.get(&key).await.unwrap().unwrap();
        assert_eq!(cached["value"], 50.0);
        assert_eq!(cached["window_days"], 30);
        assert_eq!(cached["completed_goals"], 2);
        assert_eq!(cached["total_goals"], 4);
    }

    #[tokio::test]
    async fn test_compute_is_idempotent_with_unchanged_data() {
        let today = date("2026-08-07");
        let (store, user) = store_with_goal_scenario(3, 1, today).await;
        let (engine, _cache) = engine(store);

        let first = engine.compute_at(user.id, 30, today).await.unwrap();
        let second = engine.compute_at(user.id, 30, today).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_get_serves_cache_hit() {
        let today = date("2026-08-07");
        let (store, user) = store_with_goal_scenario(4, 2, today).await;
        let (engine, _cache) = engine(store.clone());

        engine.compute_at(user.id, 30, today).await.unwrap();

        // Mutate underlying data; the cached value must still be served.
        let goal = store.goal_insert(user.id, &vita_test_utils::new_goal("late")).await.unwrap();
        store
            .goal_progress_insert(goal.id, &vita_test_utils::new_progress(today, true))
            .await
            .unwrap();

        let read = engine.get(user.id, 30).await.unwrap();
        assert!(read.cached);
        assert_eq!(read.stat.completed_goals, 2);
    }

    #[tokio::test]
    async fn test_get_misses_then_computes() {
        // get() computes against the wall clock, so seed relative to it.
        let today = Utc::now().date_naive();
        let (store, user) = store_with_goal_scenario(2, 1, today).await;
        let (engine, cache) = engine(store);

        let read = engine.get(user.id, 30).await.unwrap();
        assert!(!read.cached);
        assert_eq!(read.stat.value, 50.0);

        // The miss populated the cache for the next read.
        let key = achievement_rate_cache_key(user.id);
        assert!(cache.get(&key).await.unwrap().is_some());
        let again = engine.get(user.id, 30).await.unwrap();
        assert!(again.cached);
    }

    #[tokio::test]
    async fn test_window_mismatch_recomputes() {
        let today = date("2026-08-07");
        let (store, user) = store_with_goal_scenario(4, 2, today).await;
        let (engine, _cache) = engine(store);

        engine.compute_at(user.id, 7, today).await.unwrap();

        // A 7-day entry must never satisfy a 30-day request.
        let read = engine.get(user.id, 30).await.unwrap();
        assert!(!read.cached);
        assert_eq!(read.stat.window_days, 30);
    }

    #[tokio::test]
    async fn test_undecodable_cache_entry_degrades_to_compute() {
        let today = Utc::now().date_naive();
        let (store, user) = store_with_goal_scenario(1, 1, today).await;
        let cache = Arc::new(MemoryCache::new());
        let engine = StatsEngine::new(store, cache.clone());

        let key = achievement_rate_cache_key(user.id);
        cache
            .set(&key, json!("garbage"), Duration::from_secs(60))
            .await
            .unwrap();

        let read = engine.get(user.id, 30).await.unwrap();
        assert!(!read.cached);
        assert_eq!(read.stat.value, 100.0);
    }

    #[tokio::test]
    async fn test_completed_outside_window_not_counted() {
        let (store, user) = store_with_user().await;
        let goal = store
            .goal_insert(user.id, &vita_test_utils::new_goal("old"))
            .await
            .unwrap();
        store
            .goal_progress_insert(goal.id, &vita_test_utils::new_progress(date("2026-05-01"), true))
            .await
            .unwrap();
        let (engine, _cache) = engine(store);

        let stat = engine
            .compute_at(user.id, 30, date("2026-08-07"))
            .await
            .unwrap();
        assert_eq!(stat.completed_goals, 0);
        assert_eq!(stat.total_goals, 1);
        assert_eq!(stat.value, 0.0);

        // A 365-day window reaches back far enough.
        let stat = engine
            .compute_at(user.id, 365, date("2026-08-07"))
            .await
            .unwrap();
        assert_eq!(stat.completed_goals, 1);
        assert_eq!(stat.value, 100.0);
    }
}
