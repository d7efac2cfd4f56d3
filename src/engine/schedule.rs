//! Hourly run boundaries for watch mode

use chrono::{DateTime, Duration, DurationRound, Utc};

/// Seconds past the hour at which a run fires
pub const TICK_OFFSET_SECS: i64 = 5;

/// Next `HH:00:05` strictly after `now`
pub fn next_tick(now: DateTime<Utc>) -> DateTime<Utc> {
    let hour = now.duration_trunc(Duration::hours(1)).unwrap_or(now);
    let candidate = hour + Duration::seconds(TICK_OFFSET_SECS);
    if candidate > now {
        candidate
    } else {
        candidate + Duration::hours(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 3, h, m, s).unwrap()
    }

    #[test]
    fn test_before_offset_same_hour() {
        assert_eq!(next_tick(at(10, 0, 2)), at(10, 0, 5));
    }

    #[test]
    fn test_after_offset_next_hour() {
        assert_eq!(next_tick(at(10, 0, 5)), at(11, 0, 5));
        assert_eq!(next_tick(at(10, 42, 0)), at(11, 0, 5));
    }

    #[test]
    fn test_day_rollover() {
        assert_eq!(
            next_tick(at(23, 59, 59)),
            Utc.with_ymd_and_hms(2024, 6, 4, 0, 0, 5).unwrap()
        );
    }
}
