//! Background Jobs for the VITA API
//!
//! Achievement-rate recomputation runs outside the request path:
//!
//! - `stats_worker_task`: consumes the job queue (write-triggered and
//!   manually triggered recomputes, full sweeps)
//! - `periodic_sweep_task`: enqueues a full sweep on a fixed cadence
//!
//! Jobs are fire-and-forget from the caller's perspective: enqueueing is
//! best-effort and a job failure is logged, never retried inline. The next
//! write-trigger or periodic sweep self-heals the cache.
//!
//! # Usage
//!
//! ```ignore
//! use tokio::sync::watch;
//! use vita_api::jobs::{JobQueue, StatsJobConfig, StatsJobMetrics};
//!
//! let config = StatsJobConfig::from_env();
//! let (queue, rx) = JobQueue::new(config.queue_capacity);
//! let metrics = Arc::new(StatsJobMetrics::new());
//! let (shutdown_tx, shutdown_rx) = watch::channel(false);
//!
//! tokio::spawn(stats_worker_task(engine, config.clone(), rx, metrics, shutdown_rx.clone()));
//! tokio::spawn(periodic_sweep_task(queue.clone(), config, shutdown_rx));
//!
//! // On shutdown
//! let _ = shutdown_tx.send(true);
//! ```

pub mod stats_jobs;

pub use stats_jobs::{
    periodic_sweep_task, stats_worker_task, JobQueue, StatsJob, StatsJobConfig, StatsJobMetrics,
    StatsJobSnapshot,
};
