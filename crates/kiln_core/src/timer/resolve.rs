use crate::error::TimerError;
use crate::timer::TimerSpec;
use time::{Duration, OffsetDateTime};

const SECONDS_PER_DAY: i64 = 86_400;
const SECONDS_PER_MINUTE: i64 = 60;

/// Turns a timer into the absolute instant it should fire at.
///
/// Clock-time timers are read in `now`'s UTC offset: "1 day at 09:00" means
/// 09:00 on tomorrow's date as the caller sees it. The offset is not looked up
/// again for the target date, so across a daylight-saving change the wall
/// clock reading is off by the size of the shift. When that instant is not
/// after `now` it moves forward by one day, once. The result always leads
/// `now` by at least one whole second.
pub fn resolve(spec: &TimerSpec, now: OffsetDateTime) -> Result<OffsetDateTime, TimerError> {
    match *spec {
        TimerSpec::Days(days) => offset_by(now, days, SECONDS_PER_DAY),
        TimerSpec::Minutes(minutes) => offset_by(now, minutes, SECONDS_PER_MINUTE),
        TimerSpec::DaysAtTime { days, at } => {
            let time = at.to_time()?;
            if days < 0 {
                return Err(TimerError::NonPositiveDuration);
            }

            let date = now
                .date()
                .checked_add(seconds(days, SECONDS_PER_DAY)?)
                .ok_or(TimerError::OutOfRange)?;
            let mut target = date.with_time(time).assume_offset(now.offset());
            if target <= now {
                target = target
                    .checked_add(Duration::DAY)
                    .ok_or(TimerError::OutOfRange)?;
            }

            if (target - now).whole_seconds() <= 0 {
                return Err(TimerError::NonPositiveDuration);
            }
            Ok(target)
        }
    }
}

fn offset_by(now: OffsetDateTime, count: i64, unit: i64) -> Result<OffsetDateTime, TimerError> {
    if count <= 0 {
        return Err(TimerError::NonPositiveDuration);
    }
    now.checked_add(seconds(count, unit)?)
        .ok_or(TimerError::OutOfRange)
}

fn seconds(count: i64, unit: i64) -> Result<Duration, TimerError> {
    count
        .checked_mul(unit)
        .map(Duration::seconds)
        .ok_or(TimerError::OutOfRange)
}
