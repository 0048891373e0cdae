use shared::models::Feature;
use sqlx::PgPool;

/// Insert or update a catalog feature by key
pub async fn upsert(pool: &PgPool, id: i64, feature: &Feature) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO features (id, key, name, category, value_type) VALUES ($1, $2, $3, $4, $5)
         ON CONFLICT (key) DO UPDATE SET name = $3, category = $4, value_type = $5",
    )
    .bind(id)
    .bind(&feature.key)
    .bind(&feature.name)
    .bind(&feature.category)
    .bind(feature.value_type.as_db())
    .execute(pool)
    .await?;
    Ok(())
}
