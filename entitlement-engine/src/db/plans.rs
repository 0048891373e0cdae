use serde_json::Value;
use shared::error::AppResult;
use shared::models::{FeatureValue, PlanFeature};
use sqlx::PgPool;

use super::feature_from_columns;

/// Plan feature joined with its catalog feature
#[derive(Debug, sqlx::FromRow)]
pub struct PlanFeatureRow {
    pub plan_id: i64,
    pub feature_key: String,
    pub feature_name: String,
    pub feature_category: String,
    pub value_type: String,
    pub value: Value,
    pub usage_limit: Option<i64>,
}

impl PlanFeatureRow {
    pub fn into_model(self) -> AppResult<PlanFeature> {
        let feature = feature_from_columns(
            self.feature_key,
            self.feature_name,
            self.feature_category,
            &self.value_type,
        )?;
        Ok(PlanFeature {
            plan_id: self.plan_id,
            value: FeatureValue::decode(feature.value_type, self.value),
            feature,
            limit: self.usage_limit,
        })
    }
}

const PLAN_FEATURE_COLUMNS: &str = "pf.plan_id, f.key AS feature_key, f.name AS feature_name,
    f.category AS feature_category, f.value_type, pf.value, pf.usage_limit";

/// First active plan of a tier (oldest wins)
const FIRST_ACTIVE_PLAN: &str =
    "(SELECT id FROM plans WHERE tier = $1 AND is_active ORDER BY created_at, id LIMIT 1)";

pub async fn find_feature_in_active_plan(
    pool: &PgPool,
    tier: &str,
    feature_key: &str,
) -> Result<Option<PlanFeatureRow>, sqlx::Error> {
    let sql = format!(
        "SELECT {PLAN_FEATURE_COLUMNS}
         FROM plan_features pf
         JOIN features f ON f.id = pf.feature_id
         WHERE pf.plan_id = {FIRST_ACTIVE_PLAN} AND f.key = $2"
    );
    sqlx::query_as::<_, PlanFeatureRow>(&sql)
        .bind(tier)
        .bind(feature_key)
        .fetch_optional(pool)
        .await
}

pub async fn list_features_in_active_plan(
    pool: &PgPool,
    tier: &str,
) -> Result<Vec<PlanFeatureRow>, sqlx::Error> {
    let sql = format!(
        "SELECT {PLAN_FEATURE_COLUMNS}
         FROM plan_features pf
         JOIN features f ON f.id = pf.feature_id
         WHERE pf.plan_id = {FIRST_ACTIVE_PLAN}
         ORDER BY f.key"
    );
    sqlx::query_as::<_, PlanFeatureRow>(&sql)
        .bind(tier)
        .fetch_all(pool)
        .await
}

pub async fn create(
    pool: &PgPool,
    id: i64,
    name: &str,
    tier: &str,
    now: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO plans (id, name, tier, is_active, created_at) VALUES ($1, $2, $3, TRUE, $4)",
    )
    .bind(id)
    .bind(name)
    .bind(tier)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn set_active(pool: &PgPool, plan_id: i64, is_active: bool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE plans SET is_active = $1 WHERE id = $2")
        .bind(is_active)
        .bind(plan_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Grant a feature in a plan. Returns rows affected (0 when the feature key is unknown).
pub async fn set_feature(
    pool: &PgPool,
    plan_id: i64,
    feature_key: &str,
    value: &Value,
    limit: Option<i64>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO plan_features (plan_id, feature_id, value, usage_limit)
         SELECT $1, f.id, $3, $4 FROM features f WHERE f.key = $2
         ON CONFLICT (plan_id, feature_id) DO UPDATE SET value = $3, usage_limit = $4",
    )
    .bind(plan_id)
    .bind(feature_key)
    .bind(value)
    .bind(limit)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}
