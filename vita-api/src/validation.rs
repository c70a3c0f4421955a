//! Validation Traits
//!
//! Common validation patterns extracted from route handlers.

use crate::error::{ApiError, ApiResult};
use vita_core::{DEFAULT_WINDOW_DAYS, MAX_WINDOW_DAYS, MIN_WINDOW_DAYS};

/// Trait for validating non-empty strings.
pub trait ValidateNonEmpty {
    /// Validate that the value is non-empty.
    ///
    /// # Errors
    /// Returns `ApiError::missing_field` if the value is empty or
    /// whitespace-only.
    fn validate_non_empty(&self, field_name: &str) -> ApiResult<()>;
}

impl ValidateNonEmpty for str {
    fn validate_non_empty(&self, field_name: &str) -> ApiResult<()> {
        if self.trim().is_empty() {
            return Err(ApiError::missing_field(field_name));
        }
        Ok(())
    }
}

impl ValidateNonEmpty for String {
    fn validate_non_empty(&self, field_name: &str) -> ApiResult<()> {
        self.as_str().validate_non_empty(field_name)
    }
}

/// Trait for validating numeric ranges.
pub trait ValidateRange {
    /// Validate that the value is positive (> 0).
    fn validate_positive(&self, field_name: &str) -> ApiResult<()>;

    /// Validate that the value is within an inclusive range.
    fn validate_range(&self, field_name: &str, min: Self, max: Self) -> ApiResult<()>
    where
        Self: Sized;
}

macro_rules! impl_validate_range {
    ($($t:ty),*) => {
        $(
            impl ValidateRange for $t {
                fn validate_positive(&self, field_name: &str) -> ApiResult<()> {
                    if *self <= 0 as $t {
                        return Err(ApiError::invalid_range(field_name, 1, <$t>::MAX as i64));
                    }
                    Ok(())
                }

                fn validate_range(&self, field_name: &str, min: Self, max: Self) -> ApiResult<()> {
                    if *self < min || *self > max {
                        return Err(ApiError::invalid_range(field_name, min, max));
                    }
                    Ok(())
                }
            }
        )*
    };
}

impl_validate_range!(i32, i64);

// ============================================================================
// DOMAIN-SPECIFIC VALIDATION
// ============================================================================

/// Resolve and validate a `window_days` query parameter into 1..=365,
/// defaulting to 30 when absent.
pub fn resolve_window_days(window_days: Option<i32>) -> ApiResult<i32> {
    let days = window_days.unwrap_or(DEFAULT_WINDOW_DAYS);
    days.validate_range("window_days", MIN_WINDOW_DAYS, MAX_WINDOW_DAYS)?;
    Ok(days)
}

/// Resolve and validate list pagination parameters at the HTTP boundary.
///
/// The public API clamps `limit` into 1..=100 with a forced default of 10;
/// the underlying access layer accepts an uncapped `None`, but that mode is
/// not exposed over HTTP.
pub fn resolve_pagination(limit: Option<i64>, offset: Option<i64>) -> ApiResult<(i64, i64)> {
    let limit = limit.unwrap_or(10);
    limit.validate_range("limit", 1, 100)?;
    let offset = offset.unwrap_or(0);
    if offset < 0 {
        return Err(ApiError::invalid_range("offset", 0, i64::MAX));
    }
    Ok((limit, offset))
}
