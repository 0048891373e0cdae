use shared::models::{NewUsageRecord, UsageRecord};
use sqlx::PgPool;

/// Sum of all usage quantities of an organization within `[start, end]`
pub async fn sum_between(
    pool: &PgPool,
    org_id: &str,
    start: i64,
    end: i64,
) -> Result<i64, sqlx::Error> {
    let (total,): (i64,) = sqlx::query_as(
        "SELECT COALESCE(SUM(quantity), 0)::BIGINT FROM usage_records
         WHERE organization_id = $1 AND recorded_at >= $2 AND recorded_at <= $3",
    )
    .bind(org_id)
    .bind(start)
    .bind(end)
    .fetch_one(pool)
    .await?;
    Ok(total)
}

/// Append a usage record. The id comes from the identity column; `None` when
/// the organization does not exist.
pub async fn insert(pool: &PgPool, record: &NewUsageRecord) -> Result<Option<i64>, sqlx::Error> {
    let row: Option<(i64,)> = sqlx::query_as(
        "INSERT INTO usage_records (organization_id, metric, quantity, recorded_at)
         SELECT o.id, $2, $3, $4 FROM organizations o WHERE o.id = $1
         RETURNING id",
    )
    .bind(&record.organization_id)
    .bind(&record.metric)
    .bind(record.quantity)
    .bind(record.recorded_at)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|r| r.0))
}

/// Records of an organization, oldest first
pub async fn list_for_organization(
    pool: &PgPool,
    org_id: &str,
) -> Result<Vec<UsageRecord>, sqlx::Error> {
    sqlx::query_as::<_, UsageRecord>(
        "SELECT id, organization_id, metric, quantity, recorded_at FROM usage_records
         WHERE organization_id = $1 ORDER BY recorded_at, id",
    )
    .bind(org_id)
    .fetch_all(pool)
    .await
}
