//! Id and time helpers

use rand::Rng;

/// Epoch for record ids: 2024-01-01T00:00:00Z
const ID_EPOCH_MILLIS: i64 = 1_704_067_200_000;
const TIMESTAMP_MASK: i64 = (1 << 41) - 1;
const RANDOM_BITS: u32 = 12;

/// Wall clock, Unix millis
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Time-ordered random id for features, plans, entitlements and usage records.
///
/// 41 bits of millis since [`ID_EPOCH_MILLIS`] followed by 12 random bits, so
/// ids sort by creation time and stay below 2^53.
pub fn snowflake_id() -> i64 {
    let elapsed = (now_millis() - ID_EPOCH_MILLIS) & TIMESTAMP_MASK;
    let random: i64 = rand::thread_rng().gen_range(0..1 << RANDOM_BITS);
    (elapsed << RANDOM_BITS) | random
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snowflake_ids_fit_53_bits() {
        for _ in 0..100 {
            let id = snowflake_id();
            assert!(id > 0);
            assert!(id < (1_i64 << 53));
        }
    }

    #[test]
    fn test_snowflake_ids_follow_time() {
        let before = (now_millis() - ID_EPOCH_MILLIS) << RANDOM_BITS;
        assert!(snowflake_id() >= before);
    }
}
