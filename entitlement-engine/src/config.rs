//! Engine configuration

use crate::engine::BillingZone;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Engine configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL
    pub database_url: String,
    /// Pool size for the PostgreSQL store
    pub max_connections: u32,
    /// Time zone whose calendar month bounds the usage window
    pub billing_zone: BillingZone,
    /// Default log level when RUST_LOG is unset
    pub log_level: String,
    /// Emit JSON log lines instead of human-readable ones
    pub log_json: bool,
    /// Environment: development | staging | production
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, BoxError> {
        let var = |name: &str| lookup(name).filter(|v| !v.is_empty());

        let billing_zone = match var("BILLING_TIMEZONE") {
            Some(name) => BillingZone::parse(&name)?,
            None => BillingZone::Local,
        };

        let max_connections = match var("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| format!("DATABASE_MAX_CONNECTIONS must be a positive integer, got '{raw}'"))?,
            None => 10,
        };

        Ok(Self {
            database_url: var("DATABASE_URL").ok_or("DATABASE_URL must be set")?,
            max_connections,
            billing_zone,
            log_level: var("LOG_LEVEL").unwrap_or_else(|| "info".into()),
            log_json: var("LOG_JSON").is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true")),
            environment: var("ENVIRONMENT").unwrap_or_else(|| "development".into()),
        })
    }
}
