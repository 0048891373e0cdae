//! Batch access checks

use std::collections::HashMap;

use futures::future::join_all;
use shared::access::FeatureAccess;

use super::ResolveContext;
use super::resolver::EntitlementResolver;

/// Resolve every key concurrently against one context.
///
/// Keys are independent, so completion order is irrelevant; duplicate keys
/// collapse into a single entry.
pub async fn resolve_many<K: AsRef<str> + Sync>(
    resolver: &EntitlementResolver,
    ctx: &ResolveContext<'_>,
    org_id: &str,
    feature_keys: &[K],
) -> HashMap<String, FeatureAccess> {
    let lookups = feature_keys.iter().map(|key| async move {
        let key = key.as_ref();
        (key.to_string(), resolver.resolve(ctx, org_id, key).await)
    });
    join_all(lookups).await.into_iter().collect()
}
