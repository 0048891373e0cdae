//! Feature entitlement resolution and usage metering
//!
//! Decides, per organization, whether a feature is enabled, what value/limit it
//! resolves to, and how close the organization is to that limit:
//! - Tenant entitlements shadow plan-tier defaults, feature by feature
//! - Expiry is evaluated at read time against the engine clock
//! - Usage is summed over the current calendar month
//!
//! The public operations on [`EntitlementEngine`] never fail: store errors are
//! logged and degrade to "no access", zero usage, or an empty catalog.

pub mod clock;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod logger;
pub mod store;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Config;
pub use engine::{
    BillingWindow, BillingZone, EntitlementEngine, EntitlementResolver, EntitlementStrategy,
    GrantSource, PlanStrategy, ResolutionStrategy, ResolveContext, ResolveRequest, ResolvedGrant,
};
pub use error::{StoreError, StoreResult};
pub use store::{EntitlementStore, MemoryStore, NewEntitlement, PgStore};
