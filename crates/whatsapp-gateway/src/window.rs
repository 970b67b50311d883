//! The gateway's own "send later" scheduling window.
//!
//! Campaign broadcasts may ride the gateway's native scheduling rather
//! than the local poller, and the gateway only accepts send times inside
//! a bounded window: at least [`MIN_LEAD_MINUTES`] ahead, at most
//! [`MAX_HORIZON_DAYS`] out. Locally-polled jobs have no such bound.

use chrono::{DateTime, Duration, Utc};

/// Minimum lead time the gateway accepts for a scheduled send.
pub const MIN_LEAD_MINUTES: i64 = 15;

/// Maximum scheduling horizon the gateway accepts.
pub const MAX_HORIZON_DAYS: i64 = 35;

/// Clamp a requested send time into the gateway's allowed window.
pub fn clamp_to_window(now: DateTime<Utc>, requested: DateTime<Utc>) -> DateTime<Utc> {
    let earliest = now + Duration::minutes(MIN_LEAD_MINUTES);
    let latest = now + Duration::days(MAX_HORIZON_DAYS);

    requested.clamp(earliest, latest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_raises_too_soon() {
        let now = Utc::now();
        let clamped = clamp_to_window(now, now + Duration::minutes(2));
        assert_eq!(clamped, now + Duration::minutes(MIN_LEAD_MINUTES));
    }

    #[test]
    fn test_clamp_lowers_too_far() {
        let now = Utc::now();
        let clamped = clamp_to_window(now, now + Duration::days(90));
        assert_eq!(clamped, now + Duration::days(MAX_HORIZON_DAYS));
    }

    #[test]
    fn test_clamp_keeps_in_window() {
        let now = Utc::now();
        let requested = now + Duration::hours(6);
        assert_eq!(clamp_to_window(now, requested), requested);
    }
}
