//! `tg-engine` — per-player orchestration of activables.
//!
//! # Tick
//!
//! ```text
//! tick(defs, player, now):
//!   ① Finalize — for each definition, in declaration order: if its latest
//!                activation has ended, finalize it and call
//!                ActivationHooks::on_finalized.
//!   ② Start    — for each definition, in declaration order: evaluate
//!                eligibility, try to start, call
//!                ActivationHooks::on_started_activation on success.
//! ```
//!
//! Consumption, forced ends, status queries and config reconciliation are
//! called by the host between ticks.  Everything is synchronous and
//! single-threaded; a host drives one `PlayerActivables` per player.
//!
//! # Cargo features
//!
//! | Feature | Effect                                                      |
//! |---------|-------------------------------------------------------------|
//! | `serde` | `Serialize`/`Deserialize` on `ActivableSet` and friends.    |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use tg_activable::load_definitions_csv;
//! use tg_engine::{NoopHooks, PlayerActivables};
//!
//! let defs = load_definitions_csv(Path::new("activables.csv"))?;
//! let mut player = PlayerActivables::new(NoopHooks);
//! player.tick(&defs, &ctx, now);
//! if player.is_active(&offer, now) {
//!     player.try_consume(&defs, &offer, &ctx, now);
//! }
//! ```

pub mod builder;
pub mod error;
pub mod hooks;
pub mod player;

#[cfg(test)]
mod tests;

pub use builder::PlayerActivablesBuilder;
pub use error::{EngineError, EngineResult};
pub use hooks::{ActivationHooks, NoopHooks};
pub use player::{PlayerActivables, ReconcileReport, TickReport};
