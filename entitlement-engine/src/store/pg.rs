//! PostgreSQL-backed store

use async_trait::async_trait;
use serde_json::Value;
use shared::error::AppError;
use shared::models::{
    Feature, NewUsageRecord, PlanFeature, PlanTier, TenantEntitlement, UsageRecord,
};
use shared::util::{now_millis, snowflake_id};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use super::{EntitlementStore, NewEntitlement, feature_not_found, organization_not_found};
use crate::config::Config;
use crate::db;
use crate::engine::BillingWindow;
use crate::error::StoreResult;

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect, then bring the schema up to date
    pub async fn connect(config: &Config) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await?;
        let store = Self::from_pool(pool);
        store.migrate().await?;
        Ok(store)
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    // ==================== Provisioning ====================

    pub async fn upsert_organization(&self, org_id: &str, tier: PlanTier) -> StoreResult<()> {
        db::organizations::upsert(&self.pool, org_id, tier, now_millis()).await?;
        Ok(())
    }

    pub async fn upsert_feature(&self, feature: &Feature) -> StoreResult<()> {
        db::features::upsert(&self.pool, snowflake_id(), feature).await?;
        Ok(())
    }

    /// Create an active plan for `tier`, returning its id
    pub async fn create_plan(&self, name: &str, tier: PlanTier) -> StoreResult<i64> {
        let id = snowflake_id();
        db::plans::create(&self.pool, id, name, tier.as_db(), now_millis()).await?;
        Ok(id)
    }

    pub async fn set_plan_active(&self, plan_id: i64, is_active: bool) -> StoreResult<()> {
        if db::plans::set_active(&self.pool, plan_id, is_active).await? == 0 {
            return Err(AppError::not_found(format!("Plan {}", plan_id)).into());
        }
        Ok(())
    }

    /// Grant `feature_key` in a plan, replacing any previous grant of the same key
    pub async fn set_plan_feature(
        &self,
        plan_id: i64,
        feature_key: &str,
        value: &Value,
        limit: Option<i64>,
    ) -> StoreResult<()> {
        let rows = db::plans::set_feature(&self.pool, plan_id, feature_key, value, limit).await?;
        if rows == 0 {
            return Err(feature_not_found(feature_key).into());
        }
        Ok(())
    }

    /// Provision a tenant entitlement, returning its id
    pub async fn insert_entitlement(&self, grant: &NewEntitlement) -> StoreResult<i64> {
        let id = snowflake_id();
        if db::entitlements::create(&self.pool, id, grant, now_millis()).await? == 0 {
            return Err(feature_not_found(&grant.feature_key).into());
        }
        Ok(id)
    }

    /// Recorded usage of one organization, oldest first
    pub async fn usage_records(&self, org_id: &str) -> StoreResult<Vec<UsageRecord>> {
        Ok(db::usage::list_for_organization(&self.pool, org_id).await?)
    }
}

#[async_trait]
impl EntitlementStore for PgStore {
    async fn find_organization_plan_tier(&self, org_id: &str) -> StoreResult<Option<PlanTier>> {
        match db::organizations::find_plan_tier(&self.pool, org_id).await? {
            Some(raw) => Ok(Some(db::organizations::parse_tier(org_id, &raw)?)),
            None => Ok(None),
        }
    }

    async fn find_active_entitlement(
        &self,
        org_id: &str,
        feature_key: &str,
        now_millis: i64,
    ) -> StoreResult<Option<TenantEntitlement>> {
        let row = db::entitlements::find_active(&self.pool, org_id, feature_key, now_millis).await?;
        Ok(row.map(|r| r.into_model()).transpose()?)
    }

    async fn find_active_plan_with_feature(
        &self,
        tier: PlanTier,
        feature_key: &str,
    ) -> StoreResult<Option<PlanFeature>> {
        let row = db::plans::find_feature_in_active_plan(&self.pool, tier.as_db(), feature_key).await?;
        Ok(row.map(|r| r.into_model()).transpose()?)
    }

    async fn find_active_plan_with_all_features(
        &self,
        tier: PlanTier,
    ) -> StoreResult<Vec<PlanFeature>> {
        let rows = db::plans::list_features_in_active_plan(&self.pool, tier.as_db()).await?;
        Ok(rows
            .into_iter()
            .map(|r| r.into_model())
            .collect::<Result<_, _>>()?)
    }

    async fn find_active_entitlements(
        &self,
        org_id: &str,
        now_millis: i64,
    ) -> StoreResult<Vec<TenantEntitlement>> {
        let rows = db::entitlements::list_active(&self.pool, org_id, now_millis).await?;
        Ok(rows
            .into_iter()
            .map(|r| r.into_model())
            .collect::<Result<_, _>>()?)
    }

    async fn sum_usage_in_window(&self, org_id: &str, window: BillingWindow) -> StoreResult<i64> {
        Ok(db::usage::sum_between(&self.pool, org_id, window.start_millis, window.end_millis).await?)
    }

    async fn append_usage_record(&self, record: &NewUsageRecord) -> StoreResult<i64> {
        match db::usage::insert(&self.pool, record).await? {
            Some(id) => Ok(id),
            None => Err(organization_not_found(&record.organization_id).into()),
        }
    }
}
