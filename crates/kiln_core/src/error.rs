use thiserror::Error;

/// Failures of the timer subsystem. None of these are fatal to a save: the
/// piece persists and only its reminder is left unset.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimerError {
    #[error("timer duration must be positive")]
    NonPositiveDuration,
    #[error("clock time must be between 00:00 and 23:59")]
    InvalidClockTime,
    #[error("reminder could not be scheduled: {0}")]
    SchedulingFailed(String),
    #[error("timer target is outside the supported calendar range")]
    OutOfRange,
}

impl TimerError {
    pub fn scheduling_failed<M: Into<String>>(message: M) -> Self {
        Self::SchedulingFailed(message.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::NonPositiveDuration => "non_positive_duration",
            Self::InvalidClockTime => "invalid_clock_time",
            Self::SchedulingFailed(_) => "scheduling_failed",
            Self::OutOfRange => "out_of_range",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    #[error("invalid_input - {0}")]
    InvalidInput(String),
    #[error("invalid_data - {0}")]
    InvalidData(String),
    #[error("io_error - {0}")]
    Io(String),
    #[error("{code} - {0}", code = .0.code())]
    Timer(#[from] TimerError),
}

impl AppError {
    pub fn invalid_input<M: Into<String>>(message: M) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn invalid_data<M: Into<String>>(message: M) -> Self {
        Self::InvalidData(message.into())
    }

    pub fn io<M: Into<String>>(message: M) -> Self {
        Self::Io(message.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::InvalidData(_) => "invalid_data",
            Self::Io(_) => "io_error",
            Self::Timer(err) => err.code(),
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::InvalidInput(message) | Self::InvalidData(message) | Self::Io(message) => {
                message.clone()
            }
            Self::Timer(err) => err.to_string(),
        }
    }

    pub fn timer_error(&self) -> Option<&TimerError> {
        match self {
            Self::Timer(err) => Some(err),
            _ => None,
        }
    }
}
