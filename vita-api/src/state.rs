//! Shared application state for Axum routers.
//!
//! Process-scoped resources are constructed once at startup and passed by
//! handle; there are no lazy globals. Route handlers extract the piece they
//! need via `FromRef`.

use std::sync::Arc;

use vita_storage::{Cache, RecordAccess, Store};

use crate::auth::AuthConfig;
use crate::jobs::JobQueue;
use crate::services::StatsEngine;

/// Application-wide state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    /// Generic ownership-scoped record access.
    pub records: RecordAccess,
    /// Achievement-rate engine (store + cache).
    pub stats: Arc<StatsEngine>,
    /// Sending half of the stats job queue.
    pub jobs: JobQueue,
    /// Token-validation configuration.
    pub auth: AuthConfig,
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Store>,
        cache: Arc<dyn Cache>,
        jobs: JobQueue,
        auth: AuthConfig,
    ) -> Self {
        Self {
            records: RecordAccess::new(store.clone()),
            stats: Arc::new(StatsEngine::new(store, cache)),
            jobs,
            auth,
            start_time: std::time::Instant::now(),
        }
    }
}

// Use macro to reduce boilerplate for FromRef implementations
crate::impl_from_ref!(RecordAccess, records);
crate::impl_from_ref!(Arc<StatsEngine>, stats);
crate::impl_from_ref!(JobQueue, jobs);
crate::impl_from_ref!(AuthConfig, auth);
crate::impl_from_ref!(std::time::Instant, start_time);
