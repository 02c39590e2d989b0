use thiserror::Error;

use tg_core::{Span, TgError};

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("schedule {field} must not be negative (got {value})")]
    NegativeSpan { field: &'static str, value: Span },

    #[error("schedule recurrence must be positive (got {0})")]
    NonPositiveRecurrence(Span),

    #[error("schedule duration {duration} exceeds its recurrence {recurrence}")]
    DurationExceedsRecurrence { duration: Span, recurrence: Span },

    #[error("schedule num_repeats must be at least 1")]
    ZeroRepeats,

    #[error("schedule num_repeats > 1 requires a recurrence")]
    RepeatsWithoutRecurrence,
}

impl From<ScheduleError> for TgError {
    fn from(e: ScheduleError) -> Self {
        TgError::Config(e.to_string())
    }
}

pub type ScheduleResult<T> = Result<T, ScheduleError>;
