//! VITA Core - Entity Types
//!
//! Pure data structures with no behavior. All other crates depend on this.
//! This crate contains ONLY data types - no business logic.

use chrono::{DateTime, Utc};

pub mod entities;
pub mod enums;
pub mod error;
pub mod filter;
pub mod stats;

pub use entities::*;
pub use enums::{MealType, RecordKind};
pub use error::{CacheError, StorageError, ValidationError, VitaError, VitaResult};
pub use filter::{DateRangeFilter, GoalFilter, GoalProgressFilter, MealFilter};
pub use stats::{
    achievement_rate_cache_key, window_bounds, AchievementStat, ACHIEVEMENT_RATE_TTL_SECS,
    DEFAULT_WINDOW_DAYS, MAX_WINDOW_DAYS, MIN_WINDOW_DAYS,
};

// ============================================================================
// IDENTITY TYPES
// ============================================================================

/// Identifier for a registered user. BIGSERIAL in PostgreSQL.
pub type UserId = i64;

/// Identifier for a user-owned record (body record, meal, exercise, diary,
/// goal progress). Each record table has its own BIGSERIAL sequence.
pub type RecordId = i64;

/// Identifier for a goal.
pub type GoalId = i64;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;
