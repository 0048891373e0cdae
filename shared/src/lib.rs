//! Shared types for the entitlement workspace
//!
//! Domain models (organizations, features, plans, tenant entitlements, usage records),
//! the resolved access types handed back to callers, and the unified error system.

pub mod access;
pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use access::{FeatureAccess, Grant, OrgFeature, UsageMeter};
pub use error::{AppError, AppResult, ErrorCode};
pub use models::{
    Feature, FeatureValue, NewUsageRecord, PlanFeature, PlanTier, TenantEntitlement, UsageRecord,
    ValueType,
};
pub use serde::{Deserialize, Serialize};
