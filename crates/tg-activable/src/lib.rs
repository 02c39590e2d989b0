//! `tg-activable` — activable definitions, per-player state, and the rules
//! that move one between phases.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                    |
//! |-----------------|-------------------------------------------------------------|
//! | [`definition`]  | `ActivableDefinition`, `Lifetime`, `Cooldown`, `DefinitionSet` |
//! | [`state`]       | `ActivableState`, `ActivationRecord`, `ActivableSet`        |
//! | [`condition`]   | `PlayerContext`, `StateLookup`, `is_eligible`               |
//! | [`machine`]     | start / consume / finalize / force-end, `StartBlock`        |
//! | [`reconcile`]   | config-change reconciliation, `Adjustment`                  |
//! | [`status`]      | `VisibleStatus` projection                                  |
//! | [`loader`]      | CSV → `DefinitionSet`                                       |
//! | [`error`]       | `ActivableError`, `ActivableResult<T>`                      |
//!
//! # Design notes
//!
//! Nothing in this crate reads a clock.  Every operation takes `now` (and the
//! player's UTC offset where schedules are involved), so a recorded sequence
//! of calls replays to identical state.  The per-player orchestration (tick
//! passes, hooks) lives in `tg-engine`.

pub mod condition;
pub mod definition;
pub mod error;
pub mod loader;
pub mod machine;
pub mod reconcile;
pub mod state;
pub mod status;


pub use condition::{PlayerContext, StateLookup, audience_matches, is_eligible, precursor_satisfied};
pub use definition::{
    ActivableDefinition, Cooldown, DefinitionSet, Lifetime, Precondition, Precursor, PrecursorKind,
};
pub use error::{ActivableError, ActivableResult};
pub use loader::{load_definitions_csv, load_definitions_reader};
pub use machine::StartBlock;
pub use reconcile::Adjustment;
pub use state::{ActivableSet, ActivableState, ActivationRecord, EndReason};
pub use status::{ActiveStatus, VisibleStatus, visible_status};
