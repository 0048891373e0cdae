//! Usage aggregation and recording
//!
//! The monthly sum is deliberately unfiltered: every usage record of the
//! organization counts, whatever feature it was recorded against.

use shared::error::{AppError, ErrorCode};
use shared::models::NewUsageRecord;

use super::ResolveContext;

/// Sum of every usage record of `org_id` in the current billing month.
/// Store failures read as zero usage.
pub async fn sum_all_usage_this_month(ctx: &ResolveContext<'_>, org_id: &str) -> i64 {
    let window = ctx.billing_window();
    match ctx.store.sum_usage_in_window(org_id, window).await {
        Ok(total) => total,
        Err(e) => {
            tracing::error!(
                org_id,
                window_start = window.start_millis,
                code = %e.code(),
                error = %e,
                "Failed to sum usage, reporting zero"
            );
            0
        }
    }
}

/// Append one usage record stamped with the context's "now"
pub async fn record_usage(ctx: &ResolveContext<'_>, org_id: &str, feature_key: &str, quantity: i64) {
    if quantity <= 0 {
        let err = AppError::with_message(
            ErrorCode::InvalidUsageQuantity,
            format!("Usage quantity must be positive, got {}", quantity),
        );
        tracing::warn!(org_id, feature_key, quantity, code = %err.code, "{}", err);
        return;
    }

    let record = NewUsageRecord {
        organization_id: org_id.to_string(),
        metric: feature_key.to_string(),
        quantity,
        recorded_at: ctx.now_millis,
    };
    if let Err(e) = ctx.store.append_usage_record(&record).await {
        tracing::error!(
            org_id,
            feature_key,
            quantity,
            code = %e.code(),
            error = %e,
            "Failed to record usage"
        );
    }
}
