//! Value interpretation
//!
//! Whether a resolved feature value switches its feature on. Pure and total:
//! the match is exhaustive over [`FeatureValue`], so there is no "unknown type"
//! branch to fall through.

use shared::models::FeatureValue;

/// `true` when `value` grants the feature
pub fn is_enabled(value: &FeatureValue) -> bool {
    match value {
        FeatureValue::Boolean(on) => *on,
        FeatureValue::Number(n) => n.is_some_and(|n| n > 0.0),
        FeatureValue::String(s) => !s.is_empty(),
        // A JSON payload grants by being present
        FeatureValue::Json(payload) => !payload.is_null(),
    }
}
