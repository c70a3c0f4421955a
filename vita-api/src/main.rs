//! VITA API Server Entry Point
//!
//! Bootstraps configuration, the PostgreSQL pool, the Redis cache, and the
//! background stats jobs, then starts the Axum HTTP server.

use std::sync::Arc;

use tokio::signal;
use tokio::sync::watch;
use tracing_subscriber::{fmt, EnvFilter};

use vita_api::jobs::{periodic_sweep_task, stats_worker_task, JobQueue, StatsJobMetrics};
use vita_api::{
    create_api_router, ApiConfig, ApiError, ApiResult, AppState, AuthConfig, DbClient, DbConfig,
    RedisCache, RedisCacheConfig, StatsJobConfig,
};
use vita_storage::{Cache, Store};

#[tokio::main]
async fn main() -> ApiResult<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let api_config = ApiConfig::from_env();
    let auth_config = AuthConfig::from_env();
    let db_config = DbConfig::from_env();
    let cache_config = RedisCacheConfig::from_env();
    let jobs_config = StatsJobConfig::from_env();

    let db = DbClient::from_config(&db_config)?;
    let redis = RedisCache::connect(&cache_config).await.map_err(|err| {
        ApiError::service_unavailable(format!("Failed to connect to Redis: {}", err))
    })?;

    let store: Arc<dyn Store> = Arc::new(db);
    let cache: Arc<dyn Cache> = Arc::new(redis);

    let (jobs, job_rx) = JobQueue::new(jobs_config.queue_capacity);
    let state = AppState::new(store, cache, jobs.clone(), auth_config);

    // Background workers run on their own tasks with their own handles;
    // shutdown fans out over the watch channel.
    let metrics = Arc::new(StatsJobMetrics::new());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker = tokio::spawn(stats_worker_task(
        state.stats.clone(),
        jobs_config.clone(),
        job_rx,
        metrics,
        shutdown_rx.clone(),
    ));
    let sweeper = tokio::spawn(periodic_sweep_task(jobs, jobs_config, shutdown_rx));

    let app = create_api_router(state, &api_config);
    let addr = api_config.bind_addr();
    tracing::info!(%addr, "Starting VITA API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|err| ApiError::internal_error(format!("Failed to bind {}: {}", addr, err)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| ApiError::internal_error(format!("Server error: {}", err)))?;

    let _ = shutdown_tx.send(true);
    let _ = worker.await;
    let _ = sweeper.await;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
        tracing::info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
        tracing::info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
