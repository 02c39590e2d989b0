//! `tg-core` — foundational types for the `timegate` activation engine.
//!
//! This crate is a dependency of every other `tg-*` crate.  It intentionally
//! has no `tg-*` dependencies and minimal external ones (only `thiserror`,
//! plus optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`ids`]         | `ActivableId`, `SegmentId`, `ConditionKey`            |
//! | [`time`]        | `Timestamp`, `Span`                                   |
//! | [`error`]       | `TgError`, `TgResult`                                 |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |
//!           | Required by hosts that persist player state.               |

pub mod error;
pub mod ids;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{TgError, TgResult};
pub use ids::{ActivableId, ConditionKey, SegmentId};
pub use time::{Span, Timestamp};
