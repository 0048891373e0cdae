//! Database access layer (PostgreSQL)
//!
//! Free functions over `&PgPool` returning raw rows; conversion to domain models
//! (and rejection of malformed rows) happens in the row types' `into_model`.

pub mod entitlements;
pub mod features;
pub mod organizations;
pub mod plans;
pub mod usage;

use shared::error::AppResult;
use shared::models::Feature;

/// Catalog feature from joined `features` columns
fn feature_from_columns(
    key: String,
    name: String,
    category: String,
    value_type: &str,
) -> AppResult<Feature> {
    Ok(Feature {
        key,
        name,
        category,
        value_type: value_type.parse()?,
    })
}
