//! Resolution engine
//!
//! [`EntitlementEngine`] is the caller-facing facade. Each public operation
//! snapshots the clock once into a [`ResolveContext`] and owns its own
//! catch-and-default boundary, so none of them can fail.

mod batch;
mod catalog;
mod resolver;
pub mod strategy;
pub mod threshold;
mod usage;
pub mod value;
mod window;

pub use resolver::EntitlementResolver;
pub use strategy::{
    EntitlementStrategy, GrantSource, PlanStrategy, ResolutionStrategy, ResolveRequest,
    ResolvedGrant,
};
pub use threshold::Thresholds;
pub use window::{BillingWindow, BillingZone};

use std::collections::HashMap;
use std::sync::Arc;

use shared::access::{FeatureAccess, OrgFeature};

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::store::EntitlementStore;

/// Per-call view of the world: the store, one "now", and the billing zone
#[derive(Clone, Copy)]
pub struct ResolveContext<'a> {
    pub store: &'a dyn EntitlementStore,
    pub now_millis: i64,
    pub zone: BillingZone,
}

impl ResolveContext<'_> {
    /// Current calendar month, ending at this context's "now"
    pub fn billing_window(&self) -> BillingWindow {
        BillingWindow::current_month(self.now_millis, self.zone)
    }
}

/// Feature entitlement engine
///
/// Cheap to clone; clones share the store and resolver. Holds no cache:
/// every call reads through to the store.
pub struct EntitlementEngine<S> {
    store: Arc<S>,
    resolver: Arc<EntitlementResolver>,
    clock: Arc<dyn Clock>,
    zone: BillingZone,
}

impl<S> Clone for EntitlementEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            resolver: self.resolver.clone(),
            clock: self.clock.clone(),
            zone: self.zone,
        }
    }
}

impl<S: EntitlementStore + 'static> EntitlementEngine<S> {
    pub fn new(store: S) -> Self {
        Self::from_shared(Arc::new(store))
    }

    /// Engine over a store that is also used elsewhere (e.g. for provisioning)
    pub fn from_shared(store: Arc<S>) -> Self {
        Self {
            store,
            resolver: Arc::new(EntitlementResolver::default()),
            clock: Arc::new(SystemClock),
            zone: BillingZone::default(),
        }
    }

    /// Engine whose billing months follow the configured zone
    pub fn from_config(store: S, config: &Config) -> Self {
        Self::new(store).with_billing_zone(config.billing_zone)
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_billing_zone(mut self, zone: BillingZone) -> Self {
        self.zone = zone;
        self
    }

    /// Replace the resolution order (defaults to entitlement, then plan)
    pub fn with_strategies(mut self, strategies: Vec<Box<dyn ResolutionStrategy>>) -> Self {
        self.resolver = Arc::new(EntitlementResolver::new(strategies));
        self
    }

    pub fn billing_zone(&self) -> BillingZone {
        self.zone
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn context(&self) -> ResolveContext<'_> {
        ResolveContext {
            store: self.store.as_ref(),
            now_millis: self.clock.now_millis(),
            zone: self.zone,
        }
    }

    /// Effective access of `org_id` to `feature_key`. Denied on any store failure.
    pub async fn check_feature_access(&self, org_id: &str, feature_key: &str) -> FeatureAccess {
        self.resolver
            .resolve(&self.context(), org_id, feature_key)
            .await
    }

    /// Resolve several features concurrently. Every requested key is present in the result.
    pub async fn check_multiple_features<K>(
        &self,
        org_id: &str,
        feature_keys: &[K],
    ) -> HashMap<String, FeatureAccess>
    where
        K: AsRef<str> + Sync,
    {
        batch::resolve_many(&self.resolver, &self.context(), org_id, feature_keys).await
    }

    /// Append a usage record tagged with `feature_key`. Failures are logged, never returned.
    pub async fn record_feature_usage(&self, org_id: &str, feature_key: &str, quantity: i64) {
        usage::record_usage(&self.context(), org_id, feature_key, quantity).await
    }

    /// [`record_feature_usage`](Self::record_feature_usage) with quantity 1
    pub async fn record_feature_usage_once(&self, org_id: &str, feature_key: &str) {
        self.record_feature_usage(org_id, feature_key, 1).await
    }

    /// Effective feature catalog of `org_id`. Empty on any store failure.
    pub async fn get_organization_features(&self, org_id: &str) -> Vec<OrgFeature> {
        catalog::list_effective_features(&self.context(), org_id).await
    }

    /// Total usage of `org_id` this calendar month, across all metrics. Zero on failure.
    pub async fn sum_all_usage_this_month(&self, org_id: &str) -> i64 {
        usage::sum_all_usage_this_month(&self.context(), org_id).await
    }
}
