use crate::error::{AppError, TimerError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::Time;

/// A time of day in 24-hour form, written `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime {
    pub hour: u8,
    pub minute: u8,
}

impl ClockTime {
    pub fn new(hour: u8, minute: u8) -> Result<Self, TimerError> {
        let clock = Self { hour, minute };
        clock.to_time()?;
        Ok(clock)
    }

    pub fn to_time(self) -> Result<Time, TimerError> {
        if self.hour > 23 || self.minute > 59 {
            return Err(TimerError::InvalidClockTime);
        }
        Time::from_hms(self.hour, self.minute, 0).map_err(|_| TimerError::InvalidClockTime)
    }
}

impl FromStr for ClockTime {
    type Err = TimerError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (hour, minute) = raw
            .trim()
            .split_once(':')
            .ok_or(TimerError::InvalidClockTime)?;
        let hour = hour.trim();
        let minute = minute.trim();
        if hour.is_empty() || hour.len() > 2 || minute.len() != 2 {
            return Err(TimerError::InvalidClockTime);
        }
        let hour = hour.parse::<u8>().map_err(|_| TimerError::InvalidClockTime)?;
        let minute = minute
            .parse::<u8>()
            .map_err(|_| TimerError::InvalidClockTime)?;
        Self::new(hour, minute)
    }
}

impl TryFrom<String> for ClockTime {
    type Error = TimerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ClockTime> for String {
    fn from(value: ClockTime) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// How long to wait before a reminder fires.
///
/// Exactly one encoding is ever populated. A zero-day wait only makes sense
/// with a concrete time of day, so `Days(0)` is rejected and callers use
/// `DaysAtTime { days: 0, .. }` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerSpec {
    Days(i64),
    Minutes(i64),
    DaysAtTime { days: i64, at: ClockTime },
}

impl TimerSpec {
    pub fn days(days: i64) -> Result<Self, TimerError> {
        let spec = Self::Days(days);
        spec.validate()?;
        Ok(spec)
    }

    pub fn minutes(minutes: i64) -> Result<Self, TimerError> {
        let spec = Self::Minutes(minutes);
        spec.validate()?;
        Ok(spec)
    }

    pub fn days_at_time(days: i64, at: ClockTime) -> Result<Self, TimerError> {
        let spec = Self::DaysAtTime { days, at };
        spec.validate()?;
        Ok(spec)
    }

    /// Builds a timer from the separate inputs an editor collects. Returns
    /// `None` when nothing was supplied. Only the shape is checked here: a
    /// non-positive duration is still stored and reported when the reminder
    /// is resolved.
    pub fn from_parts(
        days: Option<i64>,
        minutes: Option<i64>,
        at: Option<&str>,
    ) -> Result<Option<Self>, AppError> {
        let at = at.map(str::trim).filter(|value| !value.is_empty());
        let spec = match (days, minutes, at) {
            (None, None, None) => return Ok(None),
            (Some(_), Some(_), _) | (_, Some(_), Some(_)) => {
                return Err(AppError::invalid_input(
                    "minutes cannot be combined with days or a clock time",
                ));
            }
            (None, Some(minutes), None) => Self::Minutes(minutes),
            (Some(days), None, None) => Self::Days(days),
            (days, None, Some(at)) => Self::DaysAtTime {
                days: days.unwrap_or(0),
                at: at.parse()?,
            },
        };
        Ok(Some(spec))
    }

    /// Reads the loose `timer_days` / `timer_minutes` / `timer_time` fields
    /// of older stores. Minutes take priority, then days with an optional
    /// clock time. Zero values mean "unset".
    pub fn from_legacy_fields(
        days: Option<i64>,
        minutes: Option<i64>,
        time: Option<&str>,
    ) -> Result<Option<Self>, TimerError> {
        if let Some(minutes) = minutes.filter(|value| *value != 0) {
            return Self::minutes(minutes).map(Some);
        }

        let time = time.map(str::trim).filter(|value| !value.is_empty());
        match (days, time) {
            (Some(days), Some(time)) => Self::days_at_time(days, time.parse()?).map(Some),
            (Some(0), None) | (None, _) => Ok(None),
            (Some(days), None) => Self::days(days).map(Some),
        }
    }

    pub fn validate(&self) -> Result<(), TimerError> {
        match *self {
            Self::Days(days) if days <= 0 => Err(TimerError::NonPositiveDuration),
            Self::Minutes(minutes) if minutes <= 0 => Err(TimerError::NonPositiveDuration),
            Self::DaysAtTime { days, at } => {
                if days < 0 {
                    return Err(TimerError::NonPositiveDuration);
                }
                at.to_time().map(|_| ())
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for TimerSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Days(1) => write!(f, "1 day"),
            Self::Days(days) => write!(f, "{days} days"),
            Self::Minutes(1) => write!(f, "1 minute"),
            Self::Minutes(minutes) => write!(f, "{minutes} minutes"),
            Self::DaysAtTime { days: 0, at } => write!(f, "next {at}"),
            Self::DaysAtTime { days: 1, at } => write!(f, "1 day at {at}"),
            Self::DaysAtTime { days, at } => write!(f, "{days} days at {at}"),
        }
    }
}
