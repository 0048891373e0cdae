//! Store-layer error type
//!
//! Everything the persistence collaborator can fail with. The engine never lets
//! these escape its public operations; they are logged and mapped to safe defaults.

use shared::error::{AppError, ErrorCode};
use thiserror::Error;

/// Failure reading from or writing to the entitlement store
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database connectivity / query failure
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    /// Schema migration failure
    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    /// Rejected write or stored data that does not map onto the domain model
    /// (unknown organization, tier, value type, ...)
    #[error("malformed data: {0}")]
    Malformed(#[from] AppError),
    /// Store switched off or unreachable
    #[error("store unavailable")]
    Unavailable,
}

impl StoreError {
    /// Error code reported in logs
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Database(_) | Self::Migrate(_) => ErrorCode::DatabaseError,
            Self::Malformed(err) => err.code,
            Self::Unavailable => ErrorCode::StoreUnavailable,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
