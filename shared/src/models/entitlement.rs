//! Tenant Entitlement Model

use serde::Serialize;

use super::{Feature, FeatureValue};

/// Organization-specific override of a feature's value and limit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TenantEntitlement {
    pub id: i64,
    pub organization_id: String,
    pub feature: Feature,
    pub value: FeatureValue,
    /// `None` = unlimited
    pub limit: Option<i64>,
    pub is_active: bool,
    /// Unix millis; `None` = never expires
    pub expires_at: Option<i64>,
}

impl TenantEntitlement {
    /// Whether this entitlement is a valid override at `now_millis`.
    ///
    /// Active, and either without expiry or expiring strictly after `now_millis`.
    pub fn is_valid_at(&self, now_millis: i64) -> bool {
        self.is_active && self.expires_at.is_none_or(|at| at > now_millis)
    }
}
