//! Achievement-rate recomputation jobs.
//!
//! Two job kinds run on the worker:
//!
//! - `ComputeOne(user_id, window_days)`: recompute a single user's stat
//! - `ComputeAll(window_days)`: sweep every known user, paginating by
//!   ascending user id in fixed-size batches
//!
//! The worker holds its own engine handle (and through it its own pooled
//! store connections), so job execution never contends with the request
//! path. Per-user computations carry a bounded timeout; a full sweep has a
//! ceiling of its own and continues past individual per-user failures.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{interval, timeout, MissedTickBehavior};
use uuid::Uuid;

use crate::constants::{
    DEFAULT_PER_USER_TIMEOUT_SECS, DEFAULT_STATS_QUEUE_CAPACITY, DEFAULT_SWEEP_INTERVAL_SECS,
    DEFAULT_SWEEP_TIMEOUT_SECS, DEFAULT_USER_BATCH_SIZE,
};
use crate::services::StatsEngine;
use vita_core::{UserId, DEFAULT_WINDOW_DAYS};
use vita_storage::Store;

// ============================================================================
// JOB TYPES
// ============================================================================

/// A queued recomputation job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsJob {
    /// Recompute one user's achievement rate.
    ComputeOne { user_id: UserId, window_days: i32 },
    /// Recompute every user's achievement rate.
    ComputeAll { window_days: i32 },
}

#[derive(Debug, Clone, Copy)]
struct QueuedJob {
    id: Uuid,
    job: StatsJob,
}

// ============================================================================
// JOB QUEUE
// ============================================================================

/// Sending half of the stats job queue.
///
/// `enqueue` is non-blocking and best-effort: a full or closed queue logs a
/// warning and returns `None`. A failure to schedule must never fail the
/// originating write.
#[derive(Clone)]
pub struct JobQueue {
    tx: mpsc::Sender<QueuedJob>,
}

impl JobQueue {
    /// Create a queue with the given bounded capacity. The receiver goes to
    /// `stats_worker_task`.
    pub fn new(capacity: usize) -> (Self, JobReceiver) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, JobReceiver { rx })
    }

    /// Enqueue a job, returning its id, or `None` if the queue rejected it.
    pub fn enqueue(&self, job: StatsJob) -> Option<Uuid> {
        let id = Uuid::now_v7();
        match self.tx.try_send(QueuedJob { id, job }) {
            Ok(()) => {
                tracing::debug!(job_id = %id, ?job, "Enqueued stats job");
                Some(id)
            }
            Err(err) => {
                tracing::warn!(?job, error = %err, "Failed to enqueue stats job");
                None
            }
        }
    }

    /// Enqueue a write-triggered recompute for `user_id` with the default
    /// window.
    pub fn enqueue_recompute(&self, user_id: UserId) -> Option<Uuid> {
        self.enqueue(StatsJob::ComputeOne {
            user_id,
            window_days: DEFAULT_WINDOW_DAYS,
        })
    }
}

/// Receiving half of the stats job queue.
pub struct JobReceiver {
    rx: mpsc::Receiver<QueuedJob>,
}

#[cfg(test)]
impl JobReceiver {
    /// Non-blocking pop, used by tests to observe enqueued jobs.
    pub(crate) fn try_recv_job(&mut self) -> Option<(Uuid, StatsJob)> {
        self.rx.try_recv().ok().map(|queued| (queued.id, queued.job))
    }
}

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Configuration for the stats job worker and periodic sweep.
#[derive(Debug, Clone)]
pub struct StatsJobConfig {
    /// Bounded queue capacity (default: 256)
    pub queue_capacity: usize,

    /// How often the periodic sweep fires (default: 24 hours)
    pub sweep_interval: Duration,

    /// Users fetched per batch during a sweep (default: 100)
    pub user_batch_size: i64,

    /// Timeout for a single per-user computation (default: 5 seconds)
    pub per_user_timeout: Duration,

    /// Ceiling for a full sweep; on expiry the sweep is abandoned, not
    /// retried (default: 30 minutes)
    pub sweep_timeout: Duration,

    /// Window used by scheduled recomputations (default: 30 days)
    pub window_days: i32,
}

impl Default for StatsJobConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_STATS_QUEUE_CAPACITY,
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            user_batch_size: DEFAULT_USER_BATCH_SIZE,
            per_user_timeout: Duration::from_secs(DEFAULT_PER_USER_TIMEOUT_SECS),
            sweep_timeout: Duration::from_secs(DEFAULT_SWEEP_TIMEOUT_SECS),
            window_days: DEFAULT_WINDOW_DAYS,
        }
    }
}

impl StatsJobConfig {
    /// Create StatsJobConfig from environment variables.
    ///
    /// # Environment Variables
    /// - `VITA_STATS_QUEUE_CAPACITY`: Queue capacity (default: 256)
    /// - `VITA_STATS_SWEEP_INTERVAL_SECS`: Sweep cadence (default: 86400)
    /// - `VITA_STATS_USER_BATCH_SIZE`: Users per sweep batch (default: 100)
    /// - `VITA_STATS_PER_USER_TIMEOUT_SECS`: Per-user ceiling (default: 5)
    /// - `VITA_STATS_SWEEP_TIMEOUT_SECS`: Sweep ceiling (default: 1800)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            queue_capacity: std::env::var("VITA_STATS_QUEUE_CAPACITY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.queue_capacity),
            sweep_interval: Duration::from_secs(
                std::env::var("VITA_STATS_SWEEP_INTERVAL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_SWEEP_INTERVAL_SECS),
            ),
            user_batch_size: std::env::var("VITA_STATS_USER_BATCH_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_USER_BATCH_SIZE),
            per_user_timeout: Duration::from_secs(
                std::env::var("VITA_STATS_PER_USER_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_PER_USER_TIMEOUT_SECS),
            ),
            sweep_timeout: Duration::from_secs(
                std::env::var("VITA_STATS_SWEEP_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_SWEEP_TIMEOUT_SECS),
            ),
            window_days: defaults.window_days,
        }
    }

    /// Configuration for development/testing with short intervals.
    pub fn development() -> Self {
        Self {
            queue_capacity: 16,
            sweep_interval: Duration::from_secs(60),
            user_batch_size: 10,
            per_user_timeout: Duration::from_secs(1),
            sweep_timeout: Duration::from_secs(30),
            window_days: DEFAULT_WINDOW_DAYS,
        }
    }
}

// ============================================================================
// METRICS
// ============================================================================

/// Counters for stats job activity.
#[derive(Debug, Default)]
pub struct StatsJobMetrics {
    /// Jobs pulled off the queue since startup
    pub jobs_processed: AtomicU64,

    /// Per-user computations that succeeded
    pub users_computed: AtomicU64,

    /// Per-user computations that failed or timed out
    pub user_failures: AtomicU64,

    /// Full sweeps that ran to completion
    pub sweeps_completed: AtomicU64,
}

impl StatsJobMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get current snapshot of all counters.
    pub fn snapshot(&self) -> StatsJobSnapshot {
        StatsJobSnapshot {
            jobs_processed: self.jobs_processed.load(Ordering::Relaxed),
            users_computed: self.users_computed.load(Ordering::Relaxed),
            user_failures: self.user_failures.load(Ordering::Relaxed),
            sweeps_completed: self.sweeps_completed.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of job metrics at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsJobSnapshot {
    pub jobs_processed: u64,
    pub users_computed: u64,
    pub user_failures: u64,
    pub sweeps_completed: u64,
}

// ============================================================================
// WORKER TASK
// ============================================================================

/// Consume the job queue until shutdown or queue closure.
pub async fn stats_worker_task(
    engine: Arc<StatsEngine>,
    config: StatsJobConfig,
    mut receiver: JobReceiver,
    metrics: Arc<StatsJobMetrics>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    tracing::info!(
        per_user_timeout_secs = config.per_user_timeout.as_secs(),
        sweep_timeout_secs = config.sweep_timeout.as_secs(),
        "Stats worker started"
    );

    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    tracing::info!("Stats worker shutting down");
                    break;
                }
            }

            queued = receiver.rx.recv() => {
                let Some(queued) = queued else {
                    tracing::info!("Stats job queue closed, worker exiting");
                    break;
                };
                metrics.jobs_processed.fetch_add(1, Ordering::Relaxed);
                process_job(&engine, &config, &metrics, queued).await;
            }
        }
    }

    let snapshot = metrics.snapshot();
    tracing::info!(
        jobs_processed = snapshot.jobs_processed,
        users_computed = snapshot.users_computed,
        user_failures = snapshot.user_failures,
        sweeps_completed = snapshot.sweeps_completed,
        "Stats worker stopped"
    );
}

async fn process_job(
    engine: &StatsEngine,
    config: &StatsJobConfig,
    metrics: &StatsJobMetrics,
    queued: QueuedJob,
) {
    match queued.job {
        StatsJob::ComputeOne {
            user_id,
            window_days,
        } => {
            compute_user(engine, config, metrics, user_id, window_days).await;
        }
        StatsJob::ComputeAll { window_days } => {
            match timeout(
                config.sweep_timeout,
                run_sweep(engine, config, metrics, window_days),
            )
            .await
            {
                Ok(count) => {
                    metrics.sweeps_completed.fetch_add(1, Ordering::Relaxed);
                    tracing::info!(job_id = %queued.id, users = count, "Sweep completed");
                }
                Err(_) => {
                    // Abandoned, not retried; the next periodic sweep will
                    // cover the remainder.
                    tracing::error!(
                        job_id = %queued.id,
                        timeout_secs = config.sweep_timeout.as_secs(),
                        "Sweep timed out and was abandoned"
                    );
                }
            }
        }
    }
}

/// Compute one user's stat under the per-user timeout. Failures are logged
/// and swallowed.
async fn compute_user(
    engine: &StatsEngine,
    config: &StatsJobConfig,
    metrics: &StatsJobMetrics,
    user_id: UserId,
    window_days: i32,
) -> bool {
    match timeout(
        config.per_user_timeout,
        engine.compute(user_id, window_days),
    )
    .await
    {
        Ok(Ok(_)) => {
            metrics.users_computed.fetch_add(1, Ordering::Relaxed);
            true
        }
        Ok(Err(err)) => {
            metrics.user_failures.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(user_id, error = %err, "Achievement rate computation failed");
            false
        }
        Err(_) => {
            metrics.user_failures.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(
                user_id,
                timeout_secs = config.per_user_timeout.as_secs(),
                "Achievement rate computation timed out"
            );
            false
        }
    }
}

/// Sweep every user in ascending-id batches, continuing past individual
/// failures. Returns how many users were successfully computed.
async fn run_sweep(
    engine: &StatsEngine,
    config: &StatsJobConfig,
    metrics: &StatsJobMetrics,
    window_days: i32,
) -> u64 {
    let mut computed = 0u64;
    let mut last_id: UserId = 0;

    loop {
        let batch = match engine
            .store()
            .user_ids_page(last_id, config.user_batch_size)
            .await
        {
            Ok(batch) => batch,
            Err(err) => {
                tracing::error!(error = %err, last_id, "Failed to page users, aborting sweep");
                break;
            }
        };
        if batch.is_empty() {
            break;
        }

        for user_id in batch {
            if compute_user(engine, config, metrics, user_id, window_days).await {
                computed += 1;
            }
            last_id = user_id;
        }
    }

    computed
}

// ============================================================================
// PERIODIC SWEEP TASK
// ============================================================================

/// Enqueue a full sweep on a fixed cadence until shutdown.
///
/// The first tick fires immediately on startup, warming the cache for all
/// users. Missed ticks are skipped, not replayed.
pub async fn periodic_sweep_task(
    queue: JobQueue,
    config: StatsJobConfig,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut sweep_interval = interval(config.sweep_interval);
    sweep_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::info!(
        interval_secs = config.sweep_interval.as_secs(),
        "Periodic stats sweep scheduled"
    );

    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    tracing::info!("Periodic sweep task shutting down");
                    break;
                }
            }

            _ = sweep_interval.tick() => {
                queue.enqueue(StatsJob::ComputeAll {
                    window_days: config.window_days,
                });
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use vita_core::achievement_rate_cache_key;
    use vita_storage::{Cache, Store};
    use vita_test_utils::{
        date, new_goal, new_progress, store_with_goal_scenario, FlakyStore, MemoryCache,
        MemoryStore,
    };

    fn test_config() -> StatsJobConfig {
        StatsJobConfig::development()
    }

    #[test]
    fn test_config_default() {
        let config = StatsJobConfig::default();
        assert_eq!(config.queue_capacity, DEFAULT_STATS_QUEUE_CAPACITY);
        assert_eq!(
            config.sweep_interval,
            Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS)
        );
        assert_eq!(config.user_batch_size, DEFAULT_USER_BATCH_SIZE);
        assert_eq!(
            config.per_user_timeout,
            Duration::from_secs(DEFAULT_PER_USER_TIMEOUT_SECS)
        );
        assert_eq!(config.window_days, DEFAULT_WINDOW_DAYS);
    }

    #[test]
    fn test_config_development() {
        let config = StatsJobConfig::development();
        assert_eq!(config.user_batch_size, 10);
        assert_eq!(config.sweep_interval, Duration::from_secs(60));
    }

    #[test]
    fn test_metrics_snapshot() {
        let metrics = StatsJobMetrics::new();
        metrics.jobs_processed.store(4, Ordering::Relaxed);
        metrics.user_failures.store(1, Ordering::Relaxed);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.jobs_processed, 4);
        assert_eq!(snapshot.user_failures, 1);
        assert_eq!(snapshot.sweeps_completed, 0);
    }

    #[tokio::test]
    async fn test_enqueue_returns_job_id() {
        let (queue, _rx) = JobQueue::new(8);
        let id = queue.enqueue_recompute(1);
        assert!(id.is_some());
    }

    #[tokio::test]
    async fn test_enqueue_on_full_queue_returns_none() {
        let (queue, _rx) = JobQueue::new(1);
        assert!(queue.enqueue_recompute(1).is_some());
        // No worker is draining; the second job is rejected, not an error.
        assert!(queue.enqueue_recompute(2).is_none());
    }

    #[tokio::test]
    async fn test_worker_processes_compute_one() {
        let today = chrono::Utc::now().date_naive();
        let (store, user) = store_with_goal_scenario(2, 1, today).await;
        let cache = Arc::new(MemoryCache::new());
        let engine = Arc::new(StatsEngine::new(store, cache.clone()));
        let metrics = Arc::new(StatsJobMetrics::new());
        let (queue, rx) = JobQueue::new(8);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let worker = tokio::spawn(stats_worker_task(
            engine,
            test_config(),
            rx,
            metrics.clone(),
            shutdown_rx,
        ));

        queue
            .enqueue(StatsJob::ComputeOne {
                user_id: user.id,
                window_days: 30,
            })
            .expect("queue accepts job");

        let key = achievement_rate_cache_key(user.id);
        let mut cached = None;
        for _ in 0..50 {
            if let Some(value) = cache.get(&key).await.unwrap() {
                cached = Some(value);
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let cached = cached.expect("worker populated cache");
        assert_eq!(cached["value"], 50.0);
        assert_eq!(metrics.snapshot().users_computed, 1);

        let _ = shutdown_tx.send(true);
        worker.await.unwrap();
    }

    #[tokio::test]
    async fn test_sweep_continues_past_per_user_failures() {
        let inner = Arc::new(MemoryStore::new());
        let alice = inner.add_user("alice@example.com");
        let broken = inner.add_user("broken@example.com");
        let carol = inner.add_user("carol@example.com");
        for user in [&alice, &broken, &carol] {
            let goal = inner.goal_insert(user.id, &new_goal("g")).await.unwrap();
            inner
                .goal_progress_insert(goal.id, &new_progress(date("2026-08-07"), true))
                .await
                .unwrap();
        }

        let store = Arc::new(FlakyStore::new(inner, [broken.id]));
        let cache = Arc::new(MemoryCache::new());
        let engine = StatsEngine::new(store, cache.clone());
        let metrics = StatsJobMetrics::new();
        let config = StatsJobConfig {
            user_batch_size: 2, // force multiple batches
            ..test_config()
        };

        let computed = run_sweep(&engine, &config, &metrics, 30).await;

        assert_eq!(computed, 2);
        assert_eq!(metrics.snapshot().user_failures, 1);
        assert!(cache
            .get(&achievement_rate_cache_key(alice.id))
            .await
            .unwrap()
            .is_some());
        assert!(cache
            .get(&achievement_rate_cache_key(broken.id))
            .await
            .unwrap()
            .is_none());
        assert!(cache
            .get(&achievement_rate_cache_key(carol.id))
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_worker_processes_sweep_job() {
        let today = chrono::Utc::now().date_naive();
        let (store, user) = store_with_goal_scenario(1, 1, today).await;
        let other = store.add_user("second@example.com");
        let cache = Arc::new(MemoryCache::new());
        let engine = Arc::new(StatsEngine::new(store, cache.clone()));
        let metrics = Arc::new(StatsJobMetrics::new());
        let (queue, rx) = JobQueue::new(8);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let worker = tokio::spawn(stats_worker_task(
            engine,
            test_config(),
            rx,
            metrics.clone(),
            shutdown_rx,
        ));

        queue
            .enqueue(StatsJob::ComputeAll { window_days: 30 })
            .expect("queue accepts job");

        let mut done = false;
        for _ in 0..50 {
            if metrics.snapshot().sweeps_completed == 1 {
                done = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(done, "sweep completed");
        assert_eq!(metrics.snapshot().users_computed, 2);
        assert!(cache
            .get(&achievement_rate_cache_key(user.id))
            .await
            .unwrap()
            .is_some());
        // Users with no goals still get a (zero) cached stat.
        assert!(cache
            .get(&achievement_rate_cache_key(other.id))
            .await
            .unwrap()
            .is_some());

        let _ = shutdown_tx.send(true);
        worker.await.unwrap();
    }
}
