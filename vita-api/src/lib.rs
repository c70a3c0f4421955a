//! VITA API - REST layer and process wiring
//!
//! This crate exposes the health-tracking REST endpoints (Axum) on top of
//! the generic record-access layer, and wires the production Store
//! (PostgreSQL) and Cache (Redis) implementations together with the
//! achievement-rate engine and its background jobs.

pub mod auth;
pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod jobs;
pub mod macros;
pub mod openapi;
pub mod redis_cache;
pub mod routes;
pub mod services;
pub mod state;
pub mod types;
pub mod validation;

// Re-export commonly used types
pub use auth::{generate_token, validate_token, AuthConfig, AuthUser, Claims};
pub use config::ApiConfig;
pub use db::{DbClient, DbConfig};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use jobs::{
    periodic_sweep_task, stats_worker_task, JobQueue, StatsJob, StatsJobConfig, StatsJobMetrics,
};
pub use openapi::ApiDoc;
pub use redis_cache::{RedisCache, RedisCacheConfig};
pub use routes::create_api_router;
pub use services::{StatRead, StatsEngine};
pub use state::AppState;
pub use types::*;
