//! Error codes
//!
//! - 0xxx: General
//! - 3xxx: Catalog and entitlement
//! - 9xxx: Storage and configuration

use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric error code, serialized as a bare `u16`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Referenced record does not exist
    NotFound = 3,

    // ==================== 3xxx: Entitlement ====================
    /// Feature is off for the organization
    FeatureNotAvailable = 3010,
    /// Feature key is not in the catalog
    FeatureNotFound = 3101,
    /// Stored value type is not one of BOOLEAN / NUMBER / STRING / JSON
    UnknownValueType = 3102,
    /// Stored plan tier is not recognized
    UnknownPlanTier = 3103,
    /// Usage has reached the configured limit
    UsageLimitReached = 3104,
    /// Usage quantity must be positive
    InvalidUsageQuantity = 3105,

    // ==================== 9xxx: System ====================
    DatabaseError = 9002,
    ConfigError = 9005,
    /// Store switched off or unreachable
    StoreUnavailable = 9006,
}

impl ErrorCode {
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Default message for [`AppError::new`](super::AppError::new)
    pub const fn message(&self) -> &'static str {
        match self {
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::FeatureNotAvailable => "Feature is not available for this organization",
            ErrorCode::FeatureNotFound => "Feature not found",
            ErrorCode::UnknownValueType => "Unknown feature value type",
            ErrorCode::UnknownPlanTier => "Unknown plan tier",
            ErrorCode::UsageLimitReached => "Usage limit reached",
            ErrorCode::InvalidUsageQuantity => "Usage quantity must be positive",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::ConfigError => "Configuration error",
            ErrorCode::StoreUnavailable => "Entitlement store unavailable",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// `u16` that is not a known [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Ok(match value {
            3 => ErrorCode::NotFound,
            3010 => ErrorCode::FeatureNotAvailable,
            3101 => ErrorCode::FeatureNotFound,
            3102 => ErrorCode::UnknownValueType,
            3103 => ErrorCode::UnknownPlanTier,
            3104 => ErrorCode::UsageLimitReached,
            3105 => ErrorCode::InvalidUsageQuantity,
            9002 => ErrorCode::DatabaseError,
            9005 => ErrorCode::ConfigError,
            9006 => ErrorCode::StoreUnavailable,
            _ => return Err(InvalidErrorCode(value)),
        })
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
