//! Usage Record Model

use serde::{Deserialize, Serialize};

/// Append-only consumption event. Never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct UsageRecord {
    /// Assigned by the store on insert
    pub id: i64,
    pub organization_id: String,
    /// Metric tag (the feature key the usage was recorded against)
    pub metric: String,
    pub quantity: i64,
    /// Unix millis
    pub recorded_at: i64,
}

/// Usage event about to be appended; the store assigns the id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUsageRecord {
    pub organization_id: String,
    pub metric: String,
    pub quantity: i64,
    pub recorded_at: i64,
}
