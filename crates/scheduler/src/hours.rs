//! The messaging-hours gate.
//!
//! A job is gated on its *dispatch* time, not its scheduled time: queue
//! backlog or downtime can push a job across the window boundary, and a
//! review request must not land at 3 a.m. because the poller was behind.

use chrono::{DateTime, FixedOffset, TimeZone, Timelike, Utc};
use database::BotConfig;

/// Whether a local hour falls inside the window.
///
/// Windows may wrap midnight (start 18, end 2). Equal bounds mean the
/// window covers the whole day.
pub fn hour_in_window(start: i64, end: i64, hour: i64) -> bool {
    if start == end {
        return true;
    }
    if start < end {
        hour >= start && hour < end
    } else {
        hour >= start || hour < end
    }
}

/// When a job may actually be dispatched.
///
/// Returns `now` when the gate is disabled or `now` already falls inside
/// the restaurant-local window; otherwise the next window opening.
pub fn next_dispatch_time(config: &BotConfig, now: DateTime<Utc>) -> DateTime<Utc> {
    if !config.hours_enabled {
        return now;
    }

    let offset = match FixedOffset::east_opt((config.hours_utc_offset_minutes * 60) as i32) {
        Some(offset) => offset,
        // An out-of-range offset in the row means misconfigured data;
        // treat the gate as open rather than stalling the queue.
        None => return now,
    };

    let local = now.with_timezone(&offset);
    if hour_in_window(config.hours_start, config.hours_end, i64::from(local.hour())) {
        return now;
    }

    let today_open = local
        .date_naive()
        .and_hms_opt(config.hours_start as u32, 0, 0)
        .unwrap_or_else(|| local.naive_local());
    let mut open = match offset.from_local_datetime(&today_open).single() {
        Some(open) => open,
        None => return now,
    };
    if open <= local {
        open += chrono::Duration::days(1);
    }

    open.with_timezone(&Utc)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(enabled: bool, start: i64, end: i64, offset_minutes: i64) -> BotConfig {
        let now = Utc::now();
        BotConfig {
            id: "cfg1".to_string(),
            restaurant_id: "r1".to_string(),
            trigger_phrase: "menu".to_string(),
            trigger_phrase_norm: "menu".to_string(),
            active: true,
            review_delay_minutes: 120,
            hours_enabled: enabled,
            hours_start: start,
            hours_end: end,
            hours_utc_offset_minutes: offset_minutes,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_hour_in_window() {
        assert!(hour_in_window(9, 22, 9));
        assert!(hour_in_window(9, 22, 21));
        assert!(!hour_in_window(9, 22, 22));
        assert!(!hour_in_window(9, 22, 3));

        // Wrapping window 18 → 2.
        assert!(hour_in_window(18, 2, 23));
        assert!(hour_in_window(18, 2, 1));
        assert!(!hour_in_window(18, 2, 12));

        // Equal bounds: always open.
        assert!(hour_in_window(0, 0, 13));
    }

    #[test]
    fn test_disabled_gate_is_transparent() {
        let now = Utc::now();
        assert_eq!(next_dispatch_time(&config(false, 9, 22, 0), now), now);
    }

    #[test]
    fn test_out_of_window_defers_to_opening() {
        // 03:30 UTC with a UTC+1 window of 9-22 → local 04:30, next
        // opening at 09:00 local = 08:00 UTC.
        let now = Utc.with_ymd_and_hms(2025, 6, 10, 3, 30, 0).unwrap();
        let next = next_dispatch_time(&config(true, 9, 22, 60), now);
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 6, 10, 8, 0, 0).unwrap());
    }

    #[test]
    fn test_after_close_defers_to_tomorrow() {
        // 22:30 local on the 10th → opening 09:00 local on the 11th.
        let now = Utc.with_ymd_and_hms(2025, 6, 10, 21, 30, 0).unwrap();
        let next = next_dispatch_time(&config(true, 9, 22, 60), now);
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 6, 11, 8, 0, 0).unwrap());
    }

    #[test]
    fn test_in_window_dispatches_now() {
        let now = Utc.with_ymd_and_hms(2025, 6, 10, 12, 0, 0).unwrap();
        assert_eq!(next_dispatch_time(&config(true, 9, 22, 60), now), now);
    }
}
