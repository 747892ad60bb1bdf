// src/exam/timing.rs

use chrono::{DateTime, Duration, Utc};

/// Slack allowed between the deadline and a `completed` submission before
/// the server records it as a timeout.
pub const SUBMIT_GRACE_SECONDS: i64 = 60;

/// Length of an exam in seconds.
pub fn exam_duration_seconds(time_limit_minutes: i32) -> i64 {
    i64::from(time_limit_minutes.max(0)) * 60
}

/// Seconds left before the deadline, never negative.
pub fn remaining_seconds(
    started_at: DateTime<Utc>,
    time_limit_minutes: i32,
    now: DateTime<Utc>,
) -> u64 {
    let elapsed = (now - started_at).num_seconds().max(0);
    let remaining = exam_duration_seconds(time_limit_minutes) - elapsed;
    remaining.max(0) as u64
}

/// Whether an attempt finished after the deadline plus the grace period.
///
/// A deadline past the last representable instant is never reached.
pub fn is_overdue(
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
    time_limit_minutes: i32,
) -> bool {
    let allowed =
        Duration::seconds(exam_duration_seconds(time_limit_minutes) + SUBMIT_GRACE_SECONDS);
    match started_at.checked_add_signed(allowed) {
        Some(deadline) => completed_at > deadline,
        None => false,
    }
}

/// Renders a countdown as `MM:SS`.
pub fn format_countdown(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-01T09:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn remaining_counts_down() {
        let now = t0() + Duration::seconds(90);
        assert_eq!(remaining_seconds(t0(), 10, now), 510);
    }

    #[test]
    fn remaining_is_floored_at_zero() {
        let now = t0() + Duration::minutes(11);
        assert_eq!(remaining_seconds(t0(), 10, now), 0);
    }

    #[test]
    fn clock_skew_does_not_extend_the_exam() {
        let now = t0() - Duration::seconds(30);
        assert_eq!(remaining_seconds(t0(), 1, now), 60);
    }

    #[test]
    fn overdue_respects_grace() {
        let limit = 10;
        let on_time = t0() + Duration::minutes(10) + Duration::seconds(SUBMIT_GRACE_SECONDS);
        assert!(!is_overdue(t0(), on_time, limit));
        assert!(is_overdue(t0(), on_time + Duration::seconds(1), limit));
    }

    #[test]
    fn deadline_beyond_calendar_does_not_overflow() {
        let started = DateTime::<Utc>::MAX_UTC;
        assert!(!is_overdue(started, started, 10));
        assert!(!is_overdue(started, t0(), 10));
        assert_eq!(remaining_seconds(started, 10, t0()), 600);
    }

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(format_countdown(0), "00:00");
        assert_eq!(format_countdown(605), "10:05");
    }
}
