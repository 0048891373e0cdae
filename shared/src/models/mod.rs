//! Data models
//!
//! Reference data (features, plans, plan features) and tenant data (organizations,
//! entitlements, usage records). Timestamps are Unix millis (`i64`).
//! Plain row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.

pub mod entitlement;
pub mod feature;
pub mod organization;
pub mod plan;
pub mod usage;

// Re-exports
pub use entitlement::*;
pub use feature::*;
pub use organization::*;
pub use plan::*;
pub use usage::*;
