//! Error types for VITA operations

use crate::enums::RecordKind;
use crate::RecordId;
use thiserror::Error;

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Entity not found: {kind} with id {id}")]
    NotFound { kind: RecordKind, id: RecordId },

    #[error("Insert failed for {kind}: {reason}")]
    InsertFailed { kind: RecordKind, reason: String },

    #[error("Update failed for {kind} with id {id}: {reason}")]
    UpdateFailed {
        kind: RecordKind,
        id: RecordId,
        reason: String,
    },

    #[error("Query failed: {reason}")]
    QueryFailed { reason: String },

    #[error("Connection unavailable: {reason}")]
    ConnectionUnavailable { reason: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Validation errors for malformed input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Value for {field} out of range: must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },
}

/// Cache layer errors. These are always recoverable from the caller's view:
/// a failed cache read degrades to a fresh computation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache backend error: {reason}")]
    Backend { reason: String },

    #[error("Cache serialization error: {reason}")]
    Serialization { reason: String },
}

/// Top-level error type aggregating all VITA error categories.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VitaError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Result type alias used throughout the workspace.
pub type VitaResult<T> = Result<T, VitaError>;

impl VitaError {
    /// Whether this error is a not-found condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, VitaError::Storage(StorageError::NotFound { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = StorageError::NotFound {
            kind: RecordKind::Goal,
            id: 42,
        };
        assert_eq!(err.to_string(), "Entity not found: goal with id 42");
    }

    #[test]
    fn test_is_not_found() {
        let err: VitaError = StorageError::NotFound {
            kind: RecordKind::Meal,
            id: 1,
        }
        .into();
        assert!(err.is_not_found());

        let err: VitaError = ValidationError::RequiredFieldMissing {
            field: "date".to_string(),
        }
        .into();
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_out_of_range_display() {
        let err = ValidationError::OutOfRange {
            field: "window_days".to_string(),
            min: 1,
            max: 365,
        };
        assert!(err.to_string().contains("window_days"));
        assert!(err.to_string().contains("365"));
    }
}
