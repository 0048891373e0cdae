//! In-process store
//!
//! Backs tests and single-node embedding. Values are kept in their raw stored
//! form and decoded on read, exactly like the PostgreSQL store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use shared::error::AppError;
use shared::models::{
    Feature, FeatureValue, NewUsageRecord, Plan, PlanFeature, PlanTier, TenantEntitlement,
    UsageRecord,
};

use super::{EntitlementStore, NewEntitlement, feature_not_found, organization_not_found};
use crate::engine::BillingWindow;
use crate::error::{StoreError, StoreResult};

struct StoredPlanFeature {
    plan_id: i64,
    feature_key: String,
    value: Value,
    limit: Option<i64>,
}

struct StoredEntitlement {
    id: i64,
    grant: NewEntitlement,
}

#[derive(Default)]
struct State {
    organizations: HashMap<String, PlanTier>,
    features: HashMap<String, Feature>,
    /// Creation order
    plans: Vec<Plan>,
    plan_features: Vec<StoredPlanFeature>,
    /// Creation order
    entitlements: Vec<StoredEntitlement>,
    usage: Vec<UsageRecord>,
}

impl State {
    fn first_active_plan(&self, tier: PlanTier) -> Option<&Plan> {
        self.plans.iter().find(|p| p.tier == tier && p.is_active)
    }

    fn plan_feature(&self, stored: &StoredPlanFeature) -> Option<PlanFeature> {
        let feature = self.features.get(&stored.feature_key)?;
        Some(PlanFeature {
            plan_id: stored.plan_id,
            feature: feature.clone(),
            value: FeatureValue::decode(feature.value_type, stored.value.clone()),
            limit: stored.limit,
        })
    }

    fn entitlement(&self, stored: &StoredEntitlement) -> Option<TenantEntitlement> {
        let feature = self.features.get(&stored.grant.feature_key)?;
        Some(TenantEntitlement {
            id: stored.id,
            organization_id: stored.grant.organization_id.clone(),
            feature: feature.clone(),
            value: FeatureValue::decode(feature.value_type, stored.grant.value.clone()),
            limit: stored.grant.limit,
            is_active: stored.grant.is_active,
            expires_at: stored.grant.expires_at,
        })
    }

    /// Valid entitlements of `org_id`, most recent first
    fn valid_entitlements<'a>(
        &'a self,
        org_id: &'a str,
        now_millis: i64,
    ) -> impl Iterator<Item = TenantEntitlement> + 'a {
        self.entitlements
            .iter()
            .rev()
            .filter(move |e| e.grant.organization_id == org_id)
            .filter_map(move |e| self.entitlement(e))
            .filter(move |e| e.is_valid_at(now_millis))
    }
}

/// In-memory [`EntitlementStore`]
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
    unavailable: AtomicBool,
    next_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an outage: every operation fails with [`StoreError::Unavailable`]
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable);
        }
        Ok(())
    }

    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    // ==================== Provisioning ====================

    pub fn insert_organization(&self, id: impl Into<String>, tier: PlanTier) {
        self.state.write().organizations.insert(id.into(), tier);
    }

    pub fn insert_feature(&self, feature: Feature) {
        self.state
            .write()
            .features
            .insert(feature.key.clone(), feature);
    }

    /// Create an active plan for `tier`, returning its id
    pub fn insert_plan(&self, name: impl Into<String>, tier: PlanTier) -> i64 {
        let id = self.next_id();
        self.state.write().plans.push(Plan {
            id,
            name: name.into(),
            tier,
            is_active: true,
            created_at: id,
        });
        id
    }

    pub fn set_plan_active(&self, plan_id: i64, is_active: bool) -> StoreResult<()> {
        let mut state = self.state.write();
        let plan = state
            .plans
            .iter_mut()
            .find(|p| p.id == plan_id)
            .ok_or_else(|| AppError::not_found(format!("Plan {}", plan_id)))?;
        plan.is_active = is_active;
        Ok(())
    }

    /// Grant `feature_key` in a plan, replacing any previous grant of the same key
    pub fn set_plan_feature(
        &self,
        plan_id: i64,
        feature_key: &str,
        value: Value,
        limit: Option<i64>,
    ) -> StoreResult<()> {
        let mut state = self.state.write();
        if !state.plans.iter().any(|p| p.id == plan_id) {
            return Err(AppError::not_found(format!("Plan {}", plan_id)).into());
        }
        if !state.features.contains_key(feature_key) {
            return Err(feature_not_found(feature_key).into());
        }
        state
            .plan_features
            .retain(|pf| !(pf.plan_id == plan_id && pf.feature_key == feature_key));
        state.plan_features.push(StoredPlanFeature {
            plan_id,
            feature_key: feature_key.to_string(),
            value,
            limit,
        });
        Ok(())
    }

    /// Provision a tenant entitlement, returning its id
    pub fn insert_entitlement(&self, grant: NewEntitlement) -> StoreResult<i64> {
        let mut state = self.state.write();
        if !state.features.contains_key(&grant.feature_key) {
            return Err(feature_not_found(&grant.feature_key).into());
        }
        let id = self.next_id();
        state.entitlements.push(StoredEntitlement { id, grant });
        Ok(id)
    }

    /// Recorded usage of one organization, oldest first
    pub fn usage_records(&self, org_id: &str) -> Vec<UsageRecord> {
        self.state
            .read()
            .usage
            .iter()
            .filter(|r| r.organization_id == org_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl EntitlementStore for MemoryStore {
    async fn find_organization_plan_tier(&self, org_id: &str) -> StoreResult<Option<PlanTier>> {
        self.check_available()?;
        Ok(self.state.read().organizations.get(org_id).copied())
    }

    async fn find_active_entitlement(
        &self,
        org_id: &str,
        feature_key: &str,
        now_millis: i64,
    ) -> StoreResult<Option<TenantEntitlement>> {
        self.check_available()?;
        let state = self.state.read();
        let found = state
            .valid_entitlements(org_id, now_millis)
            .find(|e| e.feature.key == feature_key);
        Ok(found)
    }

    async fn find_active_plan_with_feature(
        &self,
        tier: PlanTier,
        feature_key: &str,
    ) -> StoreResult<Option<PlanFeature>> {
        self.check_available()?;
        let state = self.state.read();
        let Some(plan) = state.first_active_plan(tier) else {
            return Ok(None);
        };
        Ok(state
            .plan_features
            .iter()
            .find(|pf| pf.plan_id == plan.id && pf.feature_key == feature_key)
            .and_then(|pf| state.plan_feature(pf)))
    }

    async fn find_active_plan_with_all_features(
        &self,
        tier: PlanTier,
    ) -> StoreResult<Vec<PlanFeature>> {
        self.check_available()?;
        let state = self.state.read();
        let Some(plan) = state.first_active_plan(tier) else {
            return Ok(Vec::new());
        };
        let mut features: Vec<PlanFeature> = state
            .plan_features
            .iter()
            .filter(|pf| pf.plan_id == plan.id)
            .filter_map(|pf| state.plan_feature(pf))
            .collect();
        features.sort_by(|a, b| a.feature.key.cmp(&b.feature.key));
        Ok(features)
    }

    async fn find_active_entitlements(
        &self,
        org_id: &str,
        now_millis: i64,
    ) -> StoreResult<Vec<TenantEntitlement>> {
        self.check_available()?;
        let state = self.state.read();
        Ok(state.valid_entitlements(org_id, now_millis).collect())
    }

    async fn sum_usage_in_window(&self, org_id: &str, window: BillingWindow) -> StoreResult<i64> {
        self.check_available()?;
        Ok(self
            .state
            .read()
            .usage
            .iter()
            .filter(|r| r.organization_id == org_id && window.contains(r.recorded_at))
            .map(|r| r.quantity)
            .sum())
    }

    async fn append_usage_record(&self, record: &NewUsageRecord) -> StoreResult<i64> {
        self.check_available()?;
        let mut state = self.state.write();
        if !state.organizations.contains_key(&record.organization_id) {
            return Err(organization_not_found(&record.organization_id).into());
        }
        let id = self.next_id();
        state.usage.push(UsageRecord {
            id,
            organization_id: record.organization_id.clone(),
            metric: record.metric.clone(),
            quantity: record.quantity,
            recorded_at: record.recorded_at,
        });
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shared::error::ErrorCode;
    use shared::models::ValueType;

    fn feature(key: &str, value_type: ValueType) -> Feature {
        Feature {
            key: key.to_string(),
            name: key.to_lowercase(),
            category: "general".to_string(),
            value_type,
        }
    }

    #[tokio::test]
    async fn test_first_active_plan_wins() {
        let store = MemoryStore::new();
        store.insert_feature(feature("SEATS", ValueType::Number));
        let first = store.insert_plan("Starter 2024", PlanTier::Starter);
        let second = store.insert_plan("Starter 2025", PlanTier::Starter);
        store.set_plan_feature(first, "SEATS", json!(5), Some(5)).unwrap();
        store.set_plan_feature(second, "SEATS", json!(50), Some(50)).unwrap();

        let pf = store
            .find_active_plan_with_feature(PlanTier::Starter, "SEATS")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(pf.plan_id, first);

        store.set_plan_active(first, false).unwrap();
        let pf = store
            .find_active_plan_with_feature(PlanTier::Starter, "SEATS")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(pf.plan_id, second);
        assert_eq!(pf.value, FeatureValue::Number(Some(50.0)));
    }

    #[tokio::test]
    async fn test_feature_missing_from_first_plan_is_not_searched_elsewhere() {
        let store = MemoryStore::new();
        store.insert_feature(feature("SSO", ValueType::Boolean));
        store.insert_plan("Enterprise", PlanTier::Enterprise);
        let later = store.insert_plan("Enterprise v2", PlanTier::Enterprise);
        store.set_plan_feature(later, "SSO", json!(true), None).unwrap();

        let pf = store
            .find_active_plan_with_feature(PlanTier::Enterprise, "SSO")
            .await
            .unwrap();
        assert!(pf.is_none());
    }

    #[tokio::test]
    async fn test_entitlement_filters() {
        let store = MemoryStore::new();
        store.insert_feature(feature("BETA", ValueType::Boolean));
        store.insert_organization("org-1", PlanTier::Starter);

        store
            .insert_entitlement(NewEntitlement::new("org-1", "BETA", json!(true)).inactive())
            .unwrap();
        store
            .insert_entitlement(NewEntitlement::new("org-1", "BETA", json!(true)).expiring_at(1_000))
            .unwrap();
        assert!(store
            .find_active_entitlement("org-1", "BETA", 1_000)
            .await
            .unwrap()
            .is_none());

        let live = store
            .insert_entitlement(NewEntitlement::new("org-1", "BETA", json!("true")).expiring_at(5_000))
            .unwrap();
        let found = store
            .find_active_entitlement("org-1", "BETA", 1_000)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, live);
        assert_eq!(found.value, FeatureValue::Boolean(true));
    }

    #[tokio::test]
    async fn test_unknown_feature_rejected() {
        let store = MemoryStore::new();
        let plan = store.insert_plan("Starter", PlanTier::Starter);
        let err = store
            .set_plan_feature(plan, "NOPE", json!(true), None)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::FeatureNotFound);

        let err = store
            .insert_entitlement(NewEntitlement::new("org-1", "NOPE", json!(true)))
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::FeatureNotFound);
    }

    #[tokio::test]
    async fn test_usage_window_sum() {
        let store = MemoryStore::new();
        store.insert_organization("org-1", PlanTier::Starter);
        store.insert_organization("org-2", PlanTier::Starter);
        for (org, quantity, at) in [
            ("org-1", 3, 99),
            ("org-1", 4, 100),
            ("org-1", 5, 200),
            ("org-2", 100, 150),
            ("org-1", 6, 201),
        ] {
            store
                .append_usage_record(&NewUsageRecord {
                    organization_id: org.to_string(),
                    metric: "API_REQUESTS".to_string(),
                    quantity,
                    recorded_at: at,
                })
                .await
                .unwrap();
        }
        let window = BillingWindow {
            start_millis: 100,
            end_millis: 200,
        };
        assert_eq!(store.sum_usage_in_window("org-1", window).await.unwrap(), 9);
        assert_eq!(store.usage_records("org-1").len(), 4);
    }

    #[tokio::test]
    async fn test_unavailable() {
        let store = MemoryStore::new();
        store.set_unavailable(true);
        assert!(matches!(
            store.find_organization_plan_tier("org-1").await,
            Err(StoreError::Unavailable)
        ));
        store.set_unavailable(false);
        assert!(store.find_organization_plan_tier("org-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_usage_burst_gets_distinct_ids() {
        let store = MemoryStore::new();
        store.insert_organization("org-1", PlanTier::Starter);
        let record = NewUsageRecord {
            organization_id: "org-1".to_string(),
            metric: "API_REQUESTS".to_string(),
            quantity: 1,
            recorded_at: 500,
        };

        let mut ids = Vec::new();
        for _ in 0..200 {
            ids.push(store.append_usage_record(&record).await.unwrap());
        }
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 200);

        let window = BillingWindow {
            start_millis: 0,
            end_millis: 500,
        };
        assert_eq!(store.sum_usage_in_window("org-1", window).await.unwrap(), 200);
    }

    #[tokio::test]
    async fn test_usage_for_unknown_organization_rejected() {
        let store = MemoryStore::new();
        let err = store
            .append_usage_record(&NewUsageRecord {
                organization_id: "ghost".to_string(),
                metric: "API_REQUESTS".to_string(),
                quantity: 1,
                recorded_at: 0,
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
        assert!(store.usage_records("ghost").is_empty());
    }
}
