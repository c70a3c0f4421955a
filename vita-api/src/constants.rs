//! Shared default values for configuration.

/// Bounded capacity of the stats job queue.
pub const DEFAULT_STATS_QUEUE_CAPACITY: usize = 256;

/// How often the periodic sweep recomputes every user (default: daily).
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 86_400;

/// Users fetched per batch while sweeping.
pub const DEFAULT_USER_BATCH_SIZE: i64 = 100;

/// Ceiling for a single per-user computation.
pub const DEFAULT_PER_USER_TIMEOUT_SECS: u64 = 5;

/// Ceiling for a full sweep over all users.
pub const DEFAULT_SWEEP_TIMEOUT_SECS: u64 = 1_800;
