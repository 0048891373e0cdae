use serde_json::Value;
use shared::error::AppResult;
use shared::models::{FeatureValue, TenantEntitlement};
use sqlx::PgPool;

use super::feature_from_columns;
use crate::store::NewEntitlement;

/// Tenant entitlement joined with its catalog feature
#[derive(Debug, sqlx::FromRow)]
pub struct EntitlementRow {
    pub id: i64,
    pub organization_id: String,
    pub feature_key: String,
    pub feature_name: String,
    pub feature_category: String,
    pub value_type: String,
    pub value: Value,
    pub usage_limit: Option<i64>,
    pub is_active: bool,
    pub expires_at: Option<i64>,
}

impl EntitlementRow {
    pub fn into_model(self) -> AppResult<TenantEntitlement> {
        let feature = feature_from_columns(
            self.feature_key,
            self.feature_name,
            self.feature_category,
            &self.value_type,
        )?;
        Ok(TenantEntitlement {
            id: self.id,
            organization_id: self.organization_id,
            value: FeatureValue::decode(feature.value_type, self.value),
            feature,
            limit: self.usage_limit,
            is_active: self.is_active,
            expires_at: self.expires_at,
        })
    }
}

const ENTITLEMENT_SELECT: &str = "SELECT e.id, e.organization_id, f.key AS feature_key,
        f.name AS feature_name, f.category AS feature_category, f.value_type,
        e.value, e.usage_limit, e.is_active, e.expires_at
    FROM tenant_entitlements e
    JOIN features f ON f.id = e.feature_id
    WHERE e.organization_id = $1
      AND e.is_active
      AND (e.expires_at IS NULL OR e.expires_at > $2)";

/// Most recent valid entitlement for (org, feature)
pub async fn find_active(
    pool: &PgPool,
    org_id: &str,
    feature_key: &str,
    now: i64,
) -> Result<Option<EntitlementRow>, sqlx::Error> {
    let sql = format!("{ENTITLEMENT_SELECT} AND f.key = $3 ORDER BY e.created_at DESC, e.id DESC LIMIT 1");
    sqlx::query_as::<_, EntitlementRow>(&sql)
        .bind(org_id)
        .bind(now)
        .bind(feature_key)
        .fetch_optional(pool)
        .await
}

/// All valid entitlements of an organization, most recent first
pub async fn list_active(
    pool: &PgPool,
    org_id: &str,
    now: i64,
) -> Result<Vec<EntitlementRow>, sqlx::Error> {
    let sql = format!("{ENTITLEMENT_SELECT} ORDER BY e.created_at DESC, e.id DESC");
    sqlx::query_as::<_, EntitlementRow>(&sql)
        .bind(org_id)
        .bind(now)
        .fetch_all(pool)
        .await
}

/// Provision an entitlement. Returns rows affected (0 when the feature key is unknown).
pub async fn create(
    pool: &PgPool,
    id: i64,
    grant: &NewEntitlement,
    now: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO tenant_entitlements
            (id, organization_id, feature_id, value, usage_limit, is_active, expires_at, created_at)
         SELECT $1, $2, f.id, $4, $5, $6, $7, $8 FROM features f WHERE f.key = $3",
    )
    .bind(id)
    .bind(&grant.organization_id)
    .bind(&grant.feature_key)
    .bind(&grant.value)
    .bind(grant.limit)
    .bind(grant.is_active)
    .bind(grant.expires_at)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}
