use thiserror::Error;

use tg_core::{ActivableId, TgError};
use tg_schedule::ScheduleError;

#[derive(Debug, Error)]
pub enum ActivableError {
    #[error("activable {id}: invalid schedule: {source}")]
    Schedule {
        id: ActivableId,
        #[source]
        source: ScheduleError,
    },

    #[error("activable {id}: {reason}")]
    Invalid { id: ActivableId, reason: String },

    #[error("activable {0} is defined more than once")]
    DuplicateId(ActivableId),

    #[error("definition parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ActivableError> for TgError {
    fn from(e: ActivableError) -> Self {
        match e {
            ActivableError::Io(io) => TgError::Io(io),
            ActivableError::Parse(msg) => TgError::Parse(msg),
            other => TgError::Config(other.to_string()),
        }
    }
}

pub type ActivableResult<T> = Result<T, ActivableError>;
