//! Resolution strategies
//!
//! Precedence is an ordered list: the resolver asks each strategy in turn and
//! the first grant wins. The default order is tenant entitlement, then plan.

use async_trait::async_trait;
use shared::models::{FeatureValue, PlanTier};

use super::ResolveContext;
use crate::error::StoreResult;

/// Where a resolved grant came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantSource {
    Entitlement,
    Plan,
}

impl GrantSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Entitlement => "tenant_entitlement",
            Self::Plan => "plan",
        }
    }
}

impl std::fmt::Display for GrantSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value and limit a strategy produced for one feature
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedGrant {
    pub value: FeatureValue,
    pub limit: Option<i64>,
    pub source: GrantSource,
}

/// One feature lookup for an existing organization
#[derive(Debug, Clone, Copy)]
pub struct ResolveRequest<'a> {
    pub org_id: &'a str,
    pub tier: PlanTier,
    pub feature_key: &'a str,
}

#[async_trait]
pub trait ResolutionStrategy: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &'static str;

    /// `Ok(None)` passes the request on to the next strategy
    async fn resolve(
        &self,
        ctx: &ResolveContext<'_>,
        req: &ResolveRequest<'_>,
    ) -> StoreResult<Option<ResolvedGrant>>;
}

/// Active, unexpired tenant entitlement for the feature
#[derive(Debug, Default)]
pub struct EntitlementStrategy;

#[async_trait]
impl ResolutionStrategy for EntitlementStrategy {
    fn name(&self) -> &'static str {
        "entitlement"
    }

    async fn resolve(
        &self,
        ctx: &ResolveContext<'_>,
        req: &ResolveRequest<'_>,
    ) -> StoreResult<Option<ResolvedGrant>> {
        let entitlement = ctx
            .store
            .find_active_entitlement(req.org_id, req.feature_key, ctx.now_millis)
            .await?;
        Ok(entitlement.map(|e| ResolvedGrant {
            value: e.value,
            limit: e.limit,
            source: GrantSource::Entitlement,
        }))
    }
}

/// Feature grant bundled with the first active plan of the organization's tier
#[derive(Debug, Default)]
pub struct PlanStrategy;

#[async_trait]
impl ResolutionStrategy for PlanStrategy {
    fn name(&self) -> &'static str {
        "plan"
    }

    async fn resolve(
        &self,
        ctx: &ResolveContext<'_>,
        req: &ResolveRequest<'_>,
    ) -> StoreResult<Option<ResolvedGrant>> {
        let plan_feature = ctx
            .store
            .find_active_plan_with_feature(req.tier, req.feature_key)
            .await?;
        Ok(plan_feature.map(|pf| ResolvedGrant {
            value: pf.value,
            limit: pf.limit,
            source: GrantSource::Plan,
        }))
    }
}

/// Entitlement first, then plan
pub fn default_strategies() -> Vec<Box<dyn ResolutionStrategy>> {
    vec![Box::new(EntitlementStrategy), Box::new(PlanStrategy)]
}
