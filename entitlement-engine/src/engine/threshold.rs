//! Threshold evaluation for metered features

use shared::access::UsageMeter;

/// Share of the limit at which a feature counts as "near limit"
pub const NEAR_LIMIT_RATIO: f64 = 0.8;

/// Percentage and limit flags derived together from one (limit, usage) pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// `usage / limit * 100`; absent when either input is absent or the limit is zero
    pub percentage: Option<f64>,
    /// `usage >= limit * 0.8`
    pub is_near_limit: bool,
    /// `usage >= limit`
    pub is_at_limit: bool,
}

impl Thresholds {
    pub fn evaluate(limit: Option<i64>, usage: Option<i64>) -> Self {
        let (Some(limit), Some(usage)) = (limit, usage) else {
            return Self {
                percentage: None,
                is_near_limit: false,
                is_at_limit: false,
            };
        };

        let (limit_f, usage_f) = (limit as f64, usage as f64);
        let is_at_limit = usage >= limit;
        // at-limit always implies near-limit, even for degenerate limits
        let is_near_limit = is_at_limit || usage_f >= limit_f * NEAR_LIMIT_RATIO;
        let percentage = (limit != 0).then(|| usage_f / limit_f * 100.0);

        Self {
            percentage,
            is_near_limit,
            is_at_limit,
        }
    }

    /// Usage meter for a limited grant
    pub fn meter(limit: i64, usage: i64) -> UsageMeter {
        let thresholds = Self::evaluate(Some(limit), Some(usage));
        UsageMeter {
            usage,
            percentage: thresholds.percentage,
            is_near_limit: thresholds.is_near_limit,
            is_at_limit: thresholds.is_at_limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_inputs() {
        let expected = Thresholds {
            percentage: None,
            is_near_limit: false,
            is_at_limit: false,
        };
        assert_eq!(Thresholds::evaluate(None, Some(10)), expected);
        assert_eq!(Thresholds::evaluate(Some(10), None), expected);
        assert_eq!(Thresholds::evaluate(None, None), expected);
    }

    #[test]
    fn test_boundaries_are_inclusive() {
        let t = Thresholds::evaluate(Some(100), Some(79));
        assert!(!t.is_near_limit);
        assert!(!t.is_at_limit);

        let t = Thresholds::evaluate(Some(100), Some(80));
        assert!(t.is_near_limit);
        assert!(!t.is_at_limit);

        let t = Thresholds::evaluate(Some(100), Some(100));
        assert!(t.is_near_limit);
        assert!(t.is_at_limit);
        assert_eq!(t.percentage, Some(100.0));

        let t = Thresholds::evaluate(Some(100), Some(150));
        assert!(t.is_at_limit);
        assert_eq!(t.percentage, Some(150.0));
    }

    #[test]
    fn test_percentage() {
        assert_eq!(Thresholds::evaluate(Some(100), Some(85)).percentage, Some(85.0));
        assert_eq!(Thresholds::evaluate(Some(10), Some(7)).percentage, Some(70.0));
        assert_eq!(Thresholds::evaluate(Some(200), Some(0)).percentage, Some(0.0));
    }

    #[test]
    fn test_zero_limit() {
        let t = Thresholds::evaluate(Some(0), Some(0));
        assert_eq!(t.percentage, None);
        assert!(t.is_at_limit);
        assert!(t.is_near_limit);
    }

    #[test]
    fn test_at_limit_implies_near_limit() {
        for limit in [-10_i64, 0, 1, 5, 10, 99, 1_000] {
            for usage in -20_i64..=1_200 {
                let t = Thresholds::evaluate(Some(limit), Some(usage));
                assert_eq!(t.is_at_limit, usage >= limit);
                if t.is_at_limit {
                    assert!(t.is_near_limit, "limit={limit} usage={usage}");
                }
            }
        }
    }

    #[test]
    fn test_meter() {
        let meter = Thresholds::meter(100, 85);
        assert_eq!(meter.usage, 85);
        assert_eq!(meter.percentage, Some(85.0));
        assert!(meter.is_near_limit);
        assert!(!meter.is_at_limit);
    }
}
