//! entitlement-migrate: apply the entitlement schema to `DATABASE_URL`

use entitlement_engine::logger::init_logger;
use entitlement_engine::{Config, PgStore};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Load .env file
    let _ = dotenvy::dotenv();

    let config = Config::from_env()?;
    init_logger(&config.log_level, config.log_json);

    tracing::info!(
        "Migrating entitlement schema (env: {}, max connections: {})",
        config.environment,
        config.max_connections
    );

    let store = PgStore::connect(&config).await?;
    store.pool().close().await;

    tracing::info!("Entitlement schema is up to date");
    Ok(())
}
