//! Framework error type.
//!
//! Sub-crates define their own error enums and convert them into `TgError`
//! via `From` impls.  Engine operations themselves never fail with an error:
//! "can't start", "nothing to finalize" and friends are `bool`/`Option`
//! results.  Errors only arise while loading or validating configuration.

use thiserror::Error;

use crate::ActivableId;

/// The top-level error type for `tg-core` and a common base for sub-crates.
#[derive(Debug, Error)]
pub enum TgError {
    #[error("activable {0} not found")]
    ActivableNotFound(ActivableId),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for all `tg-*` crates.
pub type TgResult<T> = Result<T, TgError>;
