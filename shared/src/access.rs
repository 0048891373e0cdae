//! Resolved access results handed back to callers
//!
//! [`FeatureAccess`] serializes to the flat camelCase shape callers expect:
//! a denial is exactly `{"hasAccess": false}`, a grant adds `value` and `limit`
//! (`null` when unlimited), and a metered grant adds the usage fields.

use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::models::{FeatureValue, ValueType};

/// Effective access of one organization to one feature
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureAccess {
    pub has_access: bool,
    #[serde(flatten)]
    pub grant: Option<Grant>,
}

/// The value/limit a feature resolved to
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Grant {
    pub value: FeatureValue,
    pub limit: Option<i64>,
    /// Present only when `limit` is set
    #[serde(flatten)]
    pub meter: Option<UsageMeter>,
}

/// Consumption against a limit for the current billing window
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMeter {
    pub usage: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
    pub is_near_limit: bool,
    pub is_at_limit: bool,
}

impl FeatureAccess {
    /// No access, no other fields
    pub fn denied() -> Self {
        Self {
            has_access: false,
            grant: None,
        }
    }

    pub fn granted(has_access: bool, grant: Grant) -> Self {
        Self {
            has_access,
            grant: Some(grant),
        }
    }

    pub fn value(&self) -> Option<&FeatureValue> {
        self.grant.as_ref().map(|g| &g.value)
    }

    /// `None` when the feature is unlimited or not granted
    pub fn limit(&self) -> Option<i64> {
        self.grant.as_ref().and_then(|g| g.limit)
    }

    pub fn usage(&self) -> Option<i64> {
        self.meter().map(|m| m.usage)
    }

    pub fn percentage(&self) -> Option<f64> {
        self.meter().and_then(|m| m.percentage)
    }

    pub fn is_near_limit(&self) -> bool {
        self.meter().is_some_and(|m| m.is_near_limit)
    }

    pub fn is_at_limit(&self) -> bool {
        self.meter().is_some_and(|m| m.is_at_limit)
    }

    fn meter(&self) -> Option<&UsageMeter> {
        self.grant.as_ref().and_then(|g| g.meter.as_ref())
    }

    /// Gate helper for callers: error unless the feature is on and below its limit
    pub fn require(&self, feature_key: &str) -> AppResult<()> {
        if !self.has_access {
            return Err(AppError::feature_not_available(feature_key));
        }
        if let Some(meter) = self.meter()
            && meter.is_at_limit
        {
            return Err(AppError::usage_limit_reached(
                feature_key,
                meter.usage,
                self.limit().unwrap_or_default(),
            ));
        }
        Ok(())
    }
}

/// One row of an organization's effective feature catalog
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgFeature {
    pub key: String,
    pub name: String,
    pub category: String,
    pub value_type: ValueType,
    pub value: FeatureValue,
    pub limit: Option<i64>,
    /// True when a tenant entitlement supplied the value
    pub has_override: bool,
    /// Unix millis; entitlement expiry, `None` for plan-sourced rows
    pub expires_at: Option<i64>,
}
