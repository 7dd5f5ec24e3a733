use time::{OffsetDateTime, UtcOffset};

/// Source of "now". Everything that depends on the wall clock takes one of
/// these so tests can pin time instead of mocking the system.
pub trait Clock {
    fn now(&self) -> OffsetDateTime;
}

/// The real clock, reporting in the machine's local offset so that
/// clock-time timers ("tomorrow at 09:00") land on the user's local day.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc().to_offset(local_offset())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub OffsetDateTime);

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.0
    }
}

pub fn local_offset() -> UtcOffset {
    UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
}
