//! Effective feature catalog of an organization
//!
//! Plan features first, in key order, each replaced by a matching tenant
//! entitlement when one exists; add-on entitlements for features outside the
//! plan follow, most recent first. One row per feature key.

use std::collections::HashMap;

use shared::access::OrgFeature;
use shared::models::{PlanFeature, TenantEntitlement};
use tracing::error;

use super::ResolveContext;
use crate::error::StoreResult;

/// Catalog of `org_id`; empty when the organization is unknown or the store fails
pub async fn list_effective_features(ctx: &ResolveContext<'_>, org_id: &str) -> Vec<OrgFeature> {
    match try_list(ctx, org_id).await {
        Ok(features) => features,
        Err(e) => {
            error!(
                org_id,
                code = %e.code(),
                error = %e,
                "Failed to list organization features"
            );
            Vec::new()
        }
    }
}

async fn try_list(ctx: &ResolveContext<'_>, org_id: &str) -> StoreResult<Vec<OrgFeature>> {
    let Some(tier) = ctx.store.find_organization_plan_tier(org_id).await? else {
        return Ok(Vec::new());
    };
    let plan_features = ctx.store.find_active_plan_with_all_features(tier).await?;
    let entitlements = ctx
        .store
        .find_active_entitlements(org_id, ctx.now_millis)
        .await?;
    Ok(merge(plan_features, entitlements))
}

/// `entitlements` arrive most recent first; the first one per key wins
fn merge(plan_features: Vec<PlanFeature>, entitlements: Vec<TenantEntitlement>) -> Vec<OrgFeature> {
    let mut add_on_order = Vec::new();
    let mut overrides: HashMap<String, TenantEntitlement> = HashMap::new();
    for entitlement in entitlements {
        if !overrides.contains_key(&entitlement.feature.key) {
            add_on_order.push(entitlement.feature.key.clone());
            overrides.insert(entitlement.feature.key.clone(), entitlement);
        }
    }

    let mut features = Vec::with_capacity(plan_features.len() + overrides.len());
    for plan_feature in plan_features {
        features.push(match overrides.remove(&plan_feature.feature.key) {
            Some(entitlement) => from_entitlement(entitlement),
            None => from_plan(plan_feature),
        });
    }
    // whatever is left was not covered by the plan
    for key in add_on_order {
        if let Some(entitlement) = overrides.remove(&key) {
            features.push(from_entitlement(entitlement));
        }
    }
    features
}

fn from_plan(pf: PlanFeature) -> OrgFeature {
    OrgFeature {
        key: pf.feature.key,
        name: pf.feature.name,
        category: pf.feature.category,
        value_type: pf.feature.value_type,
        value: pf.value,
        limit: pf.limit,
        has_override: false,
        expires_at: None,
    }
}

fn from_entitlement(e: TenantEntitlement) -> OrgFeature {
    OrgFeature {
        key: e.feature.key,
        name: e.feature.name,
        category: e.feature.category,
        value_type: e.feature.value_type,
        value: e.value,
        limit: e.limit,
        has_override: true,
        expires_at: e.expires_at,
    }
}
