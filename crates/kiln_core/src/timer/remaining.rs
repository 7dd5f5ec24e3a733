use serde::Serialize;
use std::fmt;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RemainingTime {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub is_expired: bool,
}

impl RemainingTime {
    pub const EXPIRED: Self = Self {
        days: 0,
        hours: 0,
        minutes: 0,
        is_expired: true,
    };
}

impl fmt::Display for RemainingTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_expired {
            return write!(f, "expired");
        }
        if self.days > 0 {
            write!(f, "{}d {}h {}m", self.days, self.hours, self.minutes)
        } else if self.hours > 0 {
            write!(f, "{}h {}m", self.hours, self.minutes)
        } else {
            write!(f, "{}m", self.minutes)
        }
    }
}

/// Countdown from `now` to `fires_at`, floored to whole minutes.
pub fn project(fires_at: OffsetDateTime, now: OffsetDateTime) -> RemainingTime {
    if fires_at <= now {
        return RemainingTime::EXPIRED;
    }

    let remaining = (fires_at - now).whole_seconds();
    RemainingTime {
        days: remaining / 86_400,
        hours: remaining % 86_400 / 3_600,
        minutes: remaining % 3_600 / 60,
        is_expired: false,
    }
}

#[cfg(test)]
mod tests {
    use super::{RemainingTime, project};
    use time::Duration;
    use time::macros::datetime;

    #[test]
    fn past_or_present_targets_are_expired() {
        let now = datetime!(2024-01-02 12:00:00 UTC);
        assert_eq!(project(now, now), RemainingTime::EXPIRED);
        assert_eq!(
            project(now - Duration::minutes(5), now),
            RemainingTime::EXPIRED
        );
        assert_eq!(
            project(now - Duration::days(400), now),
            RemainingTime::EXPIRED
        );
    }

    #[test]
    fn half_way_through_a_two_day_firing() {
        let fires_at = datetime!(2024-01-03 00:00:00 UTC);
        let now = datetime!(2024-01-02 12:00:00 UTC);
        assert_eq!(
            project(fires_at, now),
            RemainingTime {
                days: 0,
                hours: 12,
                minutes: 0,
                is_expired: false,
            }
        );
    }

    #[test]
    fn seconds_are_truncated() {
        let now = datetime!(2024-01-01 00:00:00 UTC);
        let fires_at = now + Duration::seconds(59);
        assert_eq!(
            project(fires_at, now),
            RemainingTime {
                days: 0,
                hours: 0,
                minutes: 0,
                is_expired: false,
            }
        );

        let fires_at = now + Duration::days(3) + Duration::hours(4) + Duration::seconds(15 * 60 + 59);
        let remaining = project(fires_at, now);
        assert_eq!((remaining.days, remaining.hours, remaining.minutes), (3, 4, 15));
    }

    #[test]
    fn decomposition_brackets_the_real_gap() {
        let now = datetime!(2024-05-01 08:00:00 UTC);
        let mut gap = 1;
        while gap < 40 * 86_400 {
            let remaining = project(now + Duration::seconds(gap), now);
            assert!(!remaining.is_expired);
            let floor = remaining.days * 86_400 + remaining.hours * 3_600 + remaining.minutes * 60;
            assert!(floor <= gap, "gap = {gap}");
            assert!(gap < floor + 60, "gap = {gap}");
            assert!(remaining.hours < 24 && remaining.minutes < 60);
            gap += 7_919;
        }
    }

    #[test]
    fn display_formats_badge() {
        let now = datetime!(2024-01-01 00:00:00 UTC);
        assert_eq!(project(now, now).to_string(), "expired");
        assert_eq!(
            project(now + Duration::minutes(2 * 1440 + 4 * 60 + 15), now).to_string(),
            "2d 4h 15m"
        );
        assert_eq!(
            project(now + Duration::minutes(90), now).to_string(),
            "1h 30m"
        );
        assert_eq!(project(now + Duration::minutes(9), now).to_string(), "9m");
    }
}
