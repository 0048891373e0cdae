//! Application error type

use super::codes::ErrorCode;
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Application error with structured error code and details
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    /// The error code identifying the type of error
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details (offending values, context, etc.)
    pub details: Option<HashMap<String, Value>>,
}

impl AppError {
    /// Create a new error with the default message for the error code
    pub fn new(code: ErrorCode) -> Self {
        Self {
            message: code.message().to_string(),
            code,
            details: None,
        }
    }

    /// Create a new error with a custom message
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Add a detail entry to this error
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    // ==================== Convenience constructors ====================

    /// Create a not found error
    pub fn not_found(resource: impl Into<String>) -> Self {
        let r = resource.into();
        Self::with_message(ErrorCode::NotFound, format!("{} not found", r))
            .with_detail("resource", r)
    }

    /// Create a feature-not-available error for `feature_key`
    pub fn feature_not_available(feature_key: impl Into<String>) -> Self {
        let key = feature_key.into();
        Self::with_message(
            ErrorCode::FeatureNotAvailable,
            format!("Feature '{}' is not available", key),
        )
        .with_detail("feature_key", key)
    }

    /// Create a usage-limit-reached error for `feature_key`
    pub fn usage_limit_reached(feature_key: impl Into<String>, usage: i64, limit: i64) -> Self {
        let key = feature_key.into();
        Self::with_message(
            ErrorCode::UsageLimitReached,
            format!("Usage limit reached for '{}' ({}/{})", key, usage, limit),
        )
        .with_detail("feature_key", key)
        .with_detail("usage", usage)
        .with_detail("limit", limit)
    }
}

/// Result alias used by fallible model conversions
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_new() {
        let err = AppError::new(ErrorCode::NotFound);
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "Resource not found");
        assert!(err.details.is_none());
    }

    #[test]
    fn test_app_error_with_message() {
        let err = AppError::with_message(ErrorCode::FeatureNotFound, "Invalid feature key");
        assert_eq!(err.code, ErrorCode::FeatureNotFound);
        assert_eq!(err.message, "Invalid feature key");
        assert_eq!(err.to_string(), "Invalid feature key");
    }

    #[test]
    fn test_app_error_with_detail() {
        let err = AppError::not_found("Plan 42").with_detail("tier", "STARTER");

        let details = err.details.unwrap();
        assert_eq!(details.get("resource").unwrap(), "Plan 42");
        assert_eq!(details.get("tier").unwrap(), "STARTER");
    }

    #[test]
    fn test_usage_limit_reached_details() {
        let err = AppError::usage_limit_reached("API_REQUESTS", 100, 100);
        assert_eq!(err.code, ErrorCode::UsageLimitReached);
        let details = err.details.unwrap();
        assert_eq!(details.get("usage").unwrap(), 100);
        assert_eq!(details.get("feature_key").unwrap(), "API_REQUESTS");
    }
}
