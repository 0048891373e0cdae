//! Plan and Plan Feature Models

use serde::{Deserialize, Serialize};

use super::{Feature, FeatureValue, PlanTier};

/// A named bundle of feature grants for one tier.
///
/// At most one plan per tier is expected to be active; lookups take the first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub id: i64,
    pub name: String,
    pub tier: PlanTier,
    pub is_active: bool,
    pub created_at: i64,
}

/// A feature grant bundled with a plan, joined with its catalog feature
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanFeature {
    pub plan_id: i64,
    pub feature: Feature,
    pub value: FeatureValue,
    /// `None` = unlimited
    pub limit: Option<i64>,
}
