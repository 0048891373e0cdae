//! Entitlement resolver
//!
//! Organization first: a missing organization is denied without any further
//! lookups. Then the strategies run strictly in order, since a later strategy
//! must not be consulted once an earlier one has granted.

use shared::access::{FeatureAccess, Grant};
use tracing::{debug, error};

use super::ResolveContext;
use super::strategy::{ResolutionStrategy, ResolveRequest, ResolvedGrant, default_strategies};
use super::threshold::Thresholds;
use super::usage::sum_all_usage_this_month;
use super::value::is_enabled;
use crate::error::StoreResult;

pub struct EntitlementResolver {
    strategies: Vec<Box<dyn ResolutionStrategy>>,
}

impl Default for EntitlementResolver {
    fn default() -> Self {
        Self::new(default_strategies())
    }
}

impl EntitlementResolver {
    pub fn new(strategies: Vec<Box<dyn ResolutionStrategy>>) -> Self {
        Self { strategies }
    }

    /// Resolve one feature, denying access on any store failure
    pub async fn resolve(
        &self,
        ctx: &ResolveContext<'_>,
        org_id: &str,
        feature_key: &str,
    ) -> FeatureAccess {
        match self.try_resolve(ctx, org_id, feature_key).await {
            Ok(access) => access,
            Err(e) => {
                error!(
                    org_id,
                    feature_key,
                    code = %e.code(),
                    error = %e,
                    "Feature resolution failed, denying access"
                );
                FeatureAccess::denied()
            }
        }
    }

    async fn try_resolve(
        &self,
        ctx: &ResolveContext<'_>,
        org_id: &str,
        feature_key: &str,
    ) -> StoreResult<FeatureAccess> {
        let Some(tier) = ctx.store.find_organization_plan_tier(org_id).await? else {
            debug!(org_id, feature_key, "Organization not found");
            return Ok(FeatureAccess::denied());
        };

        let req = ResolveRequest {
            org_id,
            tier,
            feature_key,
        };
        for strategy in &self.strategies {
            if let Some(grant) = strategy.resolve(ctx, &req).await? {
                debug!(
                    org_id,
                    feature_key,
                    strategy = strategy.name(),
                    source = %grant.source,
                    "Feature resolved"
                );
                return Ok(assemble(ctx, org_id, grant).await);
            }
        }

        debug!(org_id, feature_key, %tier, "Feature not granted");
        Ok(FeatureAccess::denied())
    }
}

/// Access flag from the value; usage and thresholds only for limited grants
async fn assemble(ctx: &ResolveContext<'_>, org_id: &str, grant: ResolvedGrant) -> FeatureAccess {
    let has_access = is_enabled(&grant.value);
    let meter = match grant.limit {
        Some(limit) => {
            let usage = sum_all_usage_this_month(ctx, org_id).await;
            Some(Thresholds::meter(limit, usage))
        }
        None => None,
    };
    FeatureAccess::granted(
        has_access,
        Grant {
            value: grant.value,
            limit: grant.limit,
            meter,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::strategy::PlanStrategy;
    use crate::engine::{BillingWindow, BillingZone};
    use crate::error::StoreError;
    use crate::store::{EntitlementStore, MemoryStore, NewEntitlement};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;
    use shared::models::{
        Feature, FeatureValue, PlanFeature, PlanTier, TenantEntitlement, NewUsageRecord, ValueType,
    };

    const NOW: i64 = 1_700_000_000_000;

    /// Delegating store that records which lookups ran
    struct RecordingStore {
        inner: MemoryStore,
        calls: Mutex<Vec<&'static str>>,
    }

    impl RecordingStore {
        fn new(inner: MemoryStore) -> Self {
            Self {
                inner,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().clone()
        }

        fn record(&self, call: &'static str) {
            self.calls.lock().push(call);
        }
    }

    #[async_trait]
    impl EntitlementStore for RecordingStore {
        async fn find_organization_plan_tier(
            &self,
            org_id: &str,
        ) -> StoreResult<Option<PlanTier>> {
            self.record("organization");
            self.inner.find_organization_plan_tier(org_id).await
        }

        async fn find_active_entitlement(
            &self,
            org_id: &str,
            feature_key: &str,
            now_millis: i64,
        ) -> StoreResult<Option<TenantEntitlement>> {
            self.record("entitlement");
            self.inner
                .find_active_entitlement(org_id, feature_key, now_millis)
                .await
        }

        async fn find_active_plan_with_feature(
            &self,
            tier: PlanTier,
            feature_key: &str,
        ) -> StoreResult<Option<PlanFeature>> {
            self.record("plan");
            self.inner
                .find_active_plan_with_feature(tier, feature_key)
                .await
        }

        async fn find_active_plan_with_all_features(
            &self,
            tier: PlanTier,
        ) -> StoreResult<Vec<PlanFeature>> {
            self.record("plan_all");
            self.inner.find_active_plan_with_all_features(tier).await
        }

        async fn find_active_entitlements(
            &self,
            org_id: &str,
            now_millis: i64,
        ) -> StoreResult<Vec<TenantEntitlement>> {
            self.record("entitlements");
            self.inner.find_active_entitlements(org_id, now_millis).await
        }

        async fn sum_usage_in_window(
            &self,
            org_id: &str,
            window: BillingWindow,
        ) -> StoreResult<i64> {
            self.record("usage");
            self.inner.sum_usage_in_window(org_id, window).await
        }

        async fn append_usage_record(&self, record: &NewUsageRecord) -> StoreResult<i64> {
            self.record("append");
            self.inner.append_usage_record(record).await
        }
    }

    fn feature(key: &str, value_type: ValueType) -> Feature {
        Feature {
            key: key.to_string(),
            name: key.to_lowercase(),
            category: "general".to_string(),
            value_type,
        }
    }

    fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        store.insert_organization("org-1", PlanTier::Starter);
        store.insert_feature(feature("TEAM_MEMBERS", ValueType::Number));
        store.insert_feature(feature("SSO", ValueType::Boolean));
        let plan = store.insert_plan("Starter", PlanTier::Starter);
        store
            .set_plan_feature(plan, "TEAM_MEMBERS", json!(10), Some(10))
            .unwrap();
        store.set_plan_feature(plan, "SSO", json!(true), None).unwrap();
        store
    }

    fn ctx(store: &dyn EntitlementStore) -> ResolveContext<'_> {
        ResolveContext {
            store,
            now_millis: NOW,
            zone: BillingZone::Named(chrono_tz::UTC),
        }
    }

    #[tokio::test]
    async fn test_missing_organization_stops_immediately() {
        let store = RecordingStore::new(seeded());
        let access = EntitlementResolver::default()
            .resolve(&ctx(&store), "ghost", "SSO")
            .await;
        assert_eq!(access, FeatureAccess::denied());
        assert_eq!(store.calls(), ["organization"]);
    }

    #[tokio::test]
    async fn test_entitlement_shadows_plan_without_plan_lookup() {
        let inner = seeded();
        inner
            .insert_entitlement(
                NewEntitlement::new("org-1", "TEAM_MEMBERS", json!(500)).with_limit(500),
            )
            .unwrap();
        let store = RecordingStore::new(inner);

        let access = EntitlementResolver::default()
            .resolve(&ctx(&store), "org-1", "TEAM_MEMBERS")
            .await;

        assert!(access.has_access);
        assert_eq!(access.value(), Some(&FeatureValue::Number(Some(500.0))));
        assert_eq!(access.limit(), Some(500));
        assert_eq!(store.calls(), ["organization", "entitlement", "usage"]);
    }

    #[tokio::test]
    async fn test_unlimited_grant_skips_usage() {
        let store = RecordingStore::new(seeded());
        let access = EntitlementResolver::default()
            .resolve(&ctx(&store), "org-1", "SSO")
            .await;

        assert!(access.has_access);
        assert_eq!(access.limit(), None);
        assert_eq!(access.usage(), None);
        assert_eq!(store.calls(), ["organization", "entitlement", "plan"]);
    }

    #[tokio::test]
    async fn test_unknown_feature_denied() {
        let store = seeded();
        let access = EntitlementResolver::default()
            .resolve(&ctx(&store), "org-1", "WHITE_LABEL")
            .await;
        assert_eq!(access, FeatureAccess::denied());
    }

    #[tokio::test]
    async fn test_store_failure_denies() {
        let store = seeded();
        store.set_unavailable(true);
        let access = EntitlementResolver::default()
            .resolve(&ctx(&store), "org-1", "SSO")
            .await;
        assert_eq!(access, FeatureAccess::denied());
    }

    #[tokio::test]
    async fn test_usage_failure_reads_as_zero() {
        struct UsageDown(MemoryStore);

        #[async_trait]
        impl EntitlementStore for UsageDown {
            async fn find_organization_plan_tier(
                &self,
                org_id: &str,
            ) -> StoreResult<Option<PlanTier>> {
                self.0.find_organization_plan_tier(org_id).await
            }
            async fn find_active_entitlement(
                &self,
                org_id: &str,
                feature_key: &str,
                now_millis: i64,
            ) -> StoreResult<Option<TenantEntitlement>> {
                self.0
                    .find_active_entitlement(org_id, feature_key, now_millis)
                    .await
            }
            async fn find_active_plan_with_feature(
                &self,
                tier: PlanTier,
                feature_key: &str,
            ) -> StoreResult<Option<PlanFeature>> {
                self.0.find_active_plan_with_feature(tier, feature_key).await
            }
            async fn find_active_plan_with_all_features(
                &self,
                tier: PlanTier,
            ) -> StoreResult<Vec<PlanFeature>> {
                self.0.find_active_plan_with_all_features(tier).await
            }
            async fn find_active_entitlements(
                &self,
                org_id: &str,
                now_millis: i64,
            ) -> StoreResult<Vec<TenantEntitlement>> {
                self.0.find_active_entitlements(org_id, now_millis).await
            }
            async fn sum_usage_in_window(
                &self,
                _org_id: &str,
                _window: BillingWindow,
            ) -> StoreResult<i64> {
                Err(StoreError::Unavailable)
            }
            async fn append_usage_record(&self, record: &NewUsageRecord) -> StoreResult<i64> {
                self.0.append_usage_record(record).await
            }
        }

        let store = UsageDown(seeded());
        let access = EntitlementResolver::default()
            .resolve(&ctx(&store), "org-1", "TEAM_MEMBERS")
            .await;

        assert!(access.has_access);
        assert_eq!(access.usage(), Some(0));
        assert_eq!(access.percentage(), Some(0.0));
        assert!(!access.is_at_limit());
    }

    #[tokio::test]
    async fn test_custom_order_ignores_entitlements() {
        let inner = seeded();
        inner
            .insert_entitlement(NewEntitlement::new("org-1", "TEAM_MEMBERS", json!(500)))
            .unwrap();
        let store = RecordingStore::new(inner);

        let resolver = EntitlementResolver::new(vec![Box::new(PlanStrategy)]);
        let access = resolver.resolve(&ctx(&store), "org-1", "TEAM_MEMBERS").await;

        assert_eq!(access.limit(), Some(10));
        assert_eq!(store.calls(), ["organization", "plan", "usage"]);
    }
}
