//! Error Types for the VITA API
//!
//! This module defines error handling for the API layer, including:
//! - ApiError struct for structured error responses
//! - ErrorCode enum for categorizing errors
//! - IntoResponse implementation for Axum HTTP responses
//!
//! All errors are serialized as JSON with appropriate HTTP status codes.
//! Ownership violations on user-owned records always surface through the
//! NotFound codes, never Forbidden, so a caller cannot probe for the
//! existence of another user's data.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

use vita_core::{RecordId, RecordKind, StorageError, ValidationError, VitaError};

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

/// Error codes for API responses.
///
/// Each error code maps to a specific HTTP status code and represents
/// a category of error that can occur during API operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(utoipa::ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================================================
    // Authentication Errors (401)
    // ========================================================================
    /// Request lacks valid authentication credentials
    Unauthorized,

    /// Authentication token is invalid or malformed
    InvalidToken,

    /// Authentication token has expired
    TokenExpired,

    // ========================================================================
    // Validation Errors (400)
    // ========================================================================
    /// Request validation failed
    ValidationFailed,

    /// Request contains invalid input data
    InvalidInput,

    /// Required field is missing from request
    MissingField,

    /// Field value is out of valid range
    InvalidRange,

    /// Field format is incorrect
    InvalidFormat,

    // ========================================================================
    // Not Found Errors (404)
    // ========================================================================
    /// Requested entity does not exist (or belongs to another user)
    EntityNotFound,

    /// Requested user does not exist
    UserNotFound,

    /// Requested body record does not exist
    BodyRecordNotFound,

    /// Requested meal does not exist
    MealNotFound,

    /// Requested exercise does not exist
    ExerciseNotFound,

    /// Requested diary entry does not exist
    DiaryNotFound,

    /// Requested goal does not exist
    GoalNotFound,

    /// Requested goal progress entry does not exist
    GoalProgressNotFound,

    // ========================================================================
    // Conflict Errors (409)
    // ========================================================================
    /// Entity with the same identifier already exists
    EntityAlreadyExists,

    // ========================================================================
    // Server Errors (500, 503)
    // ========================================================================
    /// Internal server error
    InternalError,

    /// Database operation failed
    DatabaseError,

    /// Service is temporarily unavailable
    ServiceUnavailable,

    /// Database connection pool exhausted
    ConnectionPoolExhausted,

    /// Operation timed out
    Timeout,
}

impl ErrorCode {
    /// Get the HTTP status code for this error code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            // Authentication errors
            ErrorCode::Unauthorized | ErrorCode::InvalidToken | ErrorCode::TokenExpired => {
                StatusCode::UNAUTHORIZED
            }

            // Validation errors
            ErrorCode::ValidationFailed
            | ErrorCode::InvalidInput
            | ErrorCode::MissingField
            | ErrorCode::InvalidRange
            | ErrorCode::InvalidFormat => StatusCode::BAD_REQUEST,

            // Not found errors
            ErrorCode::EntityNotFound
            | ErrorCode::UserNotFound
            | ErrorCode::BodyRecordNotFound
            | ErrorCode::MealNotFound
            | ErrorCode::ExerciseNotFound
            | ErrorCode::DiaryNotFound
            | ErrorCode::GoalNotFound
            | ErrorCode::GoalProgressNotFound => StatusCode::NOT_FOUND,

            // Conflict errors
            ErrorCode::EntityAlreadyExists => StatusCode::CONFLICT,

            // Server errors
            ErrorCode::ServiceUnavailable | ErrorCode::ConnectionPoolExhausted => {
                StatusCode::SERVICE_UNAVAILABLE
            }

            ErrorCode::Timeout => StatusCode::GATEWAY_TIMEOUT,

            ErrorCode::InternalError | ErrorCode::DatabaseError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get a default message for this error code.
    pub fn default_message(&self) -> &'static str {
        match self {
            // Authentication
            ErrorCode::Unauthorized => "Authentication required",
            ErrorCode::InvalidToken => "Invalid authentication token",
            ErrorCode::TokenExpired => "Authentication token has expired",

            // Validation
            ErrorCode::ValidationFailed => "Request validation failed",
            ErrorCode::InvalidInput => "Invalid input data",
            ErrorCode::MissingField => "Required field is missing",
            ErrorCode::InvalidRange => "Value is out of valid range",
            ErrorCode::InvalidFormat => "Invalid format",

            // Not Found
            ErrorCode::EntityNotFound => "Entity not found",
            ErrorCode::UserNotFound => "User not found",
            ErrorCode::BodyRecordNotFound => "Body record not found",
            ErrorCode::MealNotFound => "Meal not found",
            ErrorCode::ExerciseNotFound => "Exercise not found",
            ErrorCode::DiaryNotFound => "Diary not found",
            ErrorCode::GoalNotFound => "Goal not found",
            ErrorCode::GoalProgressNotFound => "Goal progress not found",

            // Conflict
            ErrorCode::EntityAlreadyExists => "Entity already exists",

            // Server
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database operation failed",
            ErrorCode::ServiceUnavailable => "Service temporarily unavailable",
            ErrorCode::ConnectionPoolExhausted => "Connection pool exhausted",
            ErrorCode::Timeout => "Operation timed out",
        }
    }

    /// Not-found code for a record kind.
    pub fn not_found_for(kind: RecordKind) -> Self {
        match kind {
            RecordKind::User => ErrorCode::UserNotFound,
            RecordKind::BodyRecord => ErrorCode::BodyRecordNotFound,
            RecordKind::Meal => ErrorCode::MealNotFound,
            RecordKind::Exercise => ErrorCode::ExerciseNotFound,
            RecordKind::Diary => ErrorCode::DiaryNotFound,
            RecordKind::Goal => ErrorCode::GoalNotFound,
            RecordKind::GoalProgress => ErrorCode::GoalProgressNotFound,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// API ERROR STRUCT
// ============================================================================

/// Structured error response for API operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[derive(utoipa::ToSchema)]
pub struct ApiError {
    /// Error code categorizing the error
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,

    /// Optional additional details (field errors, etc.)
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Create a new API error with the given code, using the default message.
    pub fn from_code(code: ErrorCode) -> Self {
        Self {
            code,
            message: code.default_message().to_string(),
            details: None,
        }
    }

    /// Add additional details to the error.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    // ========================================================================
    // Convenience constructors for common errors
    // ========================================================================

    /// Create an Unauthorized error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    /// Create an InvalidToken error.
    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidToken, message)
    }

    /// Create a TokenExpired error.
    pub fn token_expired() -> Self {
        Self::from_code(ErrorCode::TokenExpired)
    }

    /// Create a ValidationFailed error.
    pub fn validation_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message)
    }

    /// Create an InvalidInput error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Create a MissingField error.
    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingField,
            format!("Required field '{}' is missing", field),
        )
    }

    /// Create an InvalidRange error.
    pub fn invalid_range(field: &str, min: impl fmt::Display, max: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::InvalidRange,
            format!("Field '{}' must be between {} and {}", field, min, max),
        )
    }

    /// Create an InvalidFormat error.
    pub fn invalid_format(field: &str, expected: &str) -> Self {
        Self::new(
            ErrorCode::InvalidFormat,
            format!("Field '{}' has invalid format, expected {}", field, expected),
        )
    }

    /// Create a not-found error for a record kind. Absence and foreign
    /// ownership are reported identically through this constructor.
    pub fn record_not_found(kind: RecordKind, id: RecordId) -> Self {
        Self::new(
            ErrorCode::not_found_for(kind),
            format!("{} with id {} not found", kind.display_name(), id),
        )
    }

    /// Create a GoalNotFound error.
    pub fn goal_not_found(goal_id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::GoalNotFound,
            format!("Goal with id {} not found", goal_id),
        )
    }

    /// Create an InternalError.
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Create a DatabaseError.
    pub fn database_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    /// Create a ServiceUnavailable error.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }

    /// Create a ConnectionPoolExhausted error.
    pub fn connection_pool_exhausted() -> Self {
        Self::from_code(ErrorCode::ConnectionPoolExhausted)
    }

    /// Create a Timeout error.
    pub fn timeout(operation: &str) -> Self {
        Self::new(
            ErrorCode::Timeout,
            format!("Operation '{}' timed out", operation),
        )
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// ============================================================================
// AXUM INTEGRATION
// ============================================================================

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(self);
        (status, body).into_response()
    }
}

// ============================================================================
// CONVERSIONS FROM STANDARD ERRORS
// ============================================================================

/// Convert core-layer errors into API errors with appropriate HTTP mapping.
impl From<VitaError> for ApiError {
    fn from(err: VitaError) -> Self {
        match err {
            VitaError::Storage(StorageError::NotFound { kind, id }) => {
                ApiError::record_not_found(kind, id)
            }
            VitaError::Storage(StorageError::ConnectionUnavailable { .. }) => {
                tracing::error!(error = %err, "Storage connection unavailable");
                ApiError::connection_pool_exhausted()
            }
            VitaError::Storage(storage_err) => {
                // Log the full error, return a generic message to avoid
                // leaking internal details.
                tracing::error!(error = %storage_err, "Database error");
                ApiError::database_error("Database operation failed")
            }
            VitaError::Validation(ValidationError::RequiredFieldMissing { field }) => {
                ApiError::missing_field(&field)
            }
            VitaError::Validation(ValidationError::OutOfRange { field, min, max }) => {
                ApiError::invalid_range(&field, min, max)
            }
            VitaError::Validation(validation_err) => {
                ApiError::validation_failed(validation_err.to_string())
            }
            VitaError::Cache(cache_err) => {
                // Cache failures degrade inside the engine; one reaching the
                // boundary means the degradation path itself failed.
                tracing::error!(error = %cache_err, "Cache error reached API boundary");
                ApiError::service_unavailable("Cache temporarily unavailable")
            }
        }
    }
}

/// Convert from tokio_postgres::Error to ApiError.
impl From<tokio_postgres::Error> for ApiError {
    fn from(err: tokio_postgres::Error) -> Self {
        tracing::error!("Database error: {:?}", err);
        ApiError::database_error("Database operation failed")
    }
}

/// Convert from deadpool_postgres::PoolError to ApiError.
impl From<deadpool_postgres::PoolError> for ApiError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        tracing::error!("Connection pool error: {:?}", err);

        match err {
            deadpool_postgres::PoolError::Timeout(_) => ApiError::connection_pool_exhausted(),
            deadpool_postgres::PoolError::Closed => {
                ApiError::service_unavailable("Database connection pool is closed")
            }
            _ => ApiError::database_error("Failed to acquire database connection"),
        }
    }
}

/// Convert from serde_json::Error to ApiError.
impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON serialization error: {:?}", err);
        ApiError::invalid_input(format!("Invalid JSON: {}", err))
    }
}

// ============================================================================
// RESULT TYPE ALIAS
// ============================================================================

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_status_mapping() {
        assert_eq!(ErrorCode::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ErrorCode::ValidationFailed.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ErrorCode::GoalNotFound.status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ErrorCode::EntityAlreadyExists.status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ErrorCode::InternalError.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ErrorCode::ServiceUnavailable.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(ErrorCode::Timeout.status_code(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn test_not_found_per_kind() {
        assert_eq!(
            ErrorCode::not_found_for(RecordKind::Meal),
            ErrorCode::MealNotFound
        );
        let err = ApiError::record_not_found(RecordKind::BodyRecord, 7);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert!(err.message.contains("Body record"));
        assert!(err.message.contains('7'));
    }

    #[test]
    fn test_storage_not_found_maps_to_404() {
        let err: ApiError = VitaError::from(StorageError::NotFound {
            kind: RecordKind::Goal,
            id: 3,
        })
        .into();
        assert_eq!(err.code, ErrorCode::GoalNotFound);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_validation_out_of_range_maps_to_400() {
        let err: ApiError = VitaError::from(ValidationError::OutOfRange {
            field: "window_days".to_string(),
            min: 1,
            max: 365,
        })
        .into();
        assert_eq!(err.code, ErrorCode::InvalidRange);
        assert!(err.message.contains("window_days"));
    }

    #[test]
    fn test_api_error_constructors() {
        let err = ApiError::unauthorized("Invalid credentials");
        assert_eq!(err.code, ErrorCode::Unauthorized);
        assert_eq!(err.message, "Invalid credentials");

        let err = ApiError::missing_field("date");
        assert_eq!(err.code, ErrorCode::MissingField);
        assert!(err.message.contains("date"));
    }

    #[test]
    fn test_error_serialization() -> Result<(), serde_json::Error> {
        let err = ApiError::unauthorized("Invalid token");
        let json = serde_json::to_string(&err)?;

        assert!(json.contains("UNAUTHORIZED"));
        assert!(json.contains("Invalid token"));

        let deserialized: ApiError = serde_json::from_str(&json)?;
        assert_eq!(deserialized, err);
        Ok(())
    }
}
