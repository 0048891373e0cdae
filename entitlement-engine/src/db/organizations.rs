use shared::error::{AppError, ErrorCode};
use shared::models::PlanTier;
use sqlx::PgPool;

/// Plan tier of an organization, as stored
pub async fn find_plan_tier(pool: &PgPool, org_id: &str) -> Result<Option<String>, sqlx::Error> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT plan_tier FROM organizations WHERE id = $1")
            .bind(org_id)
            .fetch_optional(pool)
            .await?;
    Ok(row.map(|r| r.0))
}

pub async fn upsert(
    pool: &PgPool,
    org_id: &str,
    tier: PlanTier,
    now: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO organizations (id, plan_tier, created_at) VALUES ($1, $2, $3)
         ON CONFLICT (id) DO UPDATE SET plan_tier = $2",
    )
    .bind(org_id)
    .bind(tier.as_db())
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

/// Parse a stored tier, rejecting unknown values
pub fn parse_tier(org_id: &str, raw: &str) -> Result<PlanTier, AppError> {
    PlanTier::from_db(raw).ok_or_else(|| {
        AppError::with_message(
            ErrorCode::UnknownPlanTier,
            format!("Organization {} has unknown plan tier '{}'", org_id, raw),
        )
        .with_detail("plan_tier", raw)
    })
}
