//! Billing window: the calendar month usage is summed over
//!
//! The window runs from the first instant of the current month, in the billing
//! zone, through "now". Only monthly windows exist; a different cycle would be
//! a new constructor here, not a change to callers.

use chrono::{DateTime, Datelike, Duration, Local, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use shared::error::{AppError, ErrorCode};

/// Time zone whose calendar defines month boundaries
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum BillingZone {
    /// Server local time
    #[default]
    Local,
    /// Named IANA zone
    Named(Tz),
}

impl BillingZone {
    /// Parse an IANA zone name, e.g. `Europe/Madrid`
    pub fn parse(name: &str) -> Result<Self, AppError> {
        name.parse::<Tz>().map(Self::Named).map_err(|_| {
            AppError::with_message(
                ErrorCode::ConfigError,
                format!("Unknown billing time zone: {}", name),
            )
            .with_detail("timezone", name)
        })
    }
}

/// Inclusive `[start_millis, end_millis]` range of Unix millis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillingWindow {
    pub start_millis: i64,
    pub end_millis: i64,
}

impl BillingWindow {
    /// Current calendar month up to `now_millis`
    pub fn current_month(now_millis: i64, zone: BillingZone) -> Self {
        let start_millis = match zone {
            BillingZone::Local => month_start_millis(&Local, now_millis),
            BillingZone::Named(tz) => month_start_millis(&tz, now_millis),
        };
        Self {
            start_millis,
            end_millis: now_millis,
        }
    }

    pub fn contains(&self, millis: i64) -> bool {
        (self.start_millis..=self.end_millis).contains(&millis)
    }
}

/// First instant of the month containing `now_millis`, as seen in `zone`
///
/// When local midnight falls in a DST gap, the month starts at the first local
/// time that exists after it.
fn month_start_millis<Z: TimeZone>(zone: &Z, now_millis: i64) -> i64 {
    let now = DateTime::<Utc>::from_timestamp_millis(now_millis).unwrap_or_default();
    let today = now.with_timezone(zone).date_naive();
    let first = today.with_day(1).unwrap_or(today);
    let midnight = first.and_time(NaiveTime::MIN);
    (0..=MINUTES_PER_DAY)
        .find_map(|minute| {
            (midnight + Duration::minutes(minute))
                .and_local_timezone(zone.clone())
                .earliest()
        })
        .map(|dt| dt.timestamp_millis())
        .unwrap_or_else(|| midnight.and_utc().timestamp_millis())
}

const MINUTES_PER_DAY: i64 = 24 * 60;
