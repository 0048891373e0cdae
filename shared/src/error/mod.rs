//! Error system shared by the workspace
//!
//! - [`ErrorCode`]: numeric codes, grouped by range
//! - [`AppError`]: code + message + structured details
//!
//! ```
//! use shared::error::{AppError, ErrorCode};
//!
//! let err = AppError::with_message(ErrorCode::UnknownValueType, "value type 'DATE' is not supported")
//!     .with_detail("value_type", "DATE");
//! assert_eq!(err.code.code(), 3102);
//! assert!(err.details.is_some());
//! ```

mod codes;
mod types;

pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{AppError, AppResult};
