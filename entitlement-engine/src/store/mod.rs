//! Persistence collaborator
//!
//! The engine only reads through [`EntitlementStore`], plus one append-only write
//! for usage records. Implementations return [`StoreError`](crate::StoreError)
//! freely; the engine owns the catch-and-default boundaries.

mod memory;
mod pg;

pub use memory::MemoryStore;
pub use pg::PgStore;

use async_trait::async_trait;
use serde_json::Value;
use shared::error::{AppError, ErrorCode};
use shared::models::{NewUsageRecord, PlanFeature, PlanTier, TenantEntitlement};

use crate::engine::BillingWindow;
use crate::error::StoreResult;

/// Read/write operations the engine needs from storage
#[async_trait]
pub trait EntitlementStore: Send + Sync {
    /// Plan tier of an organization, `None` if it does not exist
    async fn find_organization_plan_tier(&self, org_id: &str) -> StoreResult<Option<PlanTier>>;

    /// Entitlement for (org, feature) that is active and unexpired at `now_millis`.
    ///
    /// When several qualify, the most recently created one is returned.
    async fn find_active_entitlement(
        &self,
        org_id: &str,
        feature_key: &str,
        now_millis: i64,
    ) -> StoreResult<Option<TenantEntitlement>>;

    /// Plan feature for `feature_key` within the first active plan of `tier`
    async fn find_active_plan_with_feature(
        &self,
        tier: PlanTier,
        feature_key: &str,
    ) -> StoreResult<Option<PlanFeature>>;

    /// Every plan feature of the first active plan of `tier`, ordered by feature key.
    /// Empty when the tier has no active plan.
    async fn find_active_plan_with_all_features(
        &self,
        tier: PlanTier,
    ) -> StoreResult<Vec<PlanFeature>>;

    /// All entitlements of `org_id` that are active and unexpired at `now_millis`,
    /// most recently created first
    async fn find_active_entitlements(
        &self,
        org_id: &str,
        now_millis: i64,
    ) -> StoreResult<Vec<TenantEntitlement>>;

    /// Sum of usage quantities of `org_id` recorded inside `window`, across all metrics
    async fn sum_usage_in_window(&self, org_id: &str, window: BillingWindow) -> StoreResult<i64>;

    /// Append one immutable usage record, returning the id the store assigned.
    ///
    /// Fails when the organization does not exist.
    async fn append_usage_record(&self, record: &NewUsageRecord) -> StoreResult<i64>;
}

/// Provisioning input for a tenant entitlement
#[derive(Debug, Clone, PartialEq)]
pub struct NewEntitlement {
    pub organization_id: String,
    pub feature_key: String,
    /// Raw stored value, interpreted per the feature's value type on read
    pub value: Value,
    pub limit: Option<i64>,
    pub is_active: bool,
    pub expires_at: Option<i64>,
}

impl NewEntitlement {
    /// Active, unlimited, non-expiring grant
    pub fn new(organization_id: impl Into<String>, feature_key: impl Into<String>, value: Value) -> Self {
        Self {
            organization_id: organization_id.into(),
            feature_key: feature_key.into(),
            value,
            limit: None,
            is_active: true,
            expires_at: None,
        }
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn expiring_at(mut self, expires_at: i64) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }
}

/// Provisioning referenced a feature key missing from the catalog
fn organization_not_found(org_id: &str) -> AppError {
    AppError::not_found(format!("Organization {}", org_id)).with_detail("org_id", org_id)
}

fn feature_not_found(feature_key: &str) -> AppError {
    AppError::with_message(
        ErrorCode::FeatureNotFound,
        format!("Feature '{}' is not in the catalog", feature_key),
    )
    .with_detail("feature_key", feature_key)
}
