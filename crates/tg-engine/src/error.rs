use thiserror::Error;

use tg_core::{ActivableId, TgError};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("restored state for {id} is inconsistent: {reason}")]
    CorruptState { id: ActivableId, reason: &'static str },
}

impl From<EngineError> for TgError {
    fn from(e: EngineError) -> Self {
        TgError::Config(e.to_string())
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
