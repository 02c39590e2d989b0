//! `tg-schedule` — recurring calendar schedules and occasion queries.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                  |
//! |---------------|-----------------------------------------------------------|
//! | [`schedule`]  | `TimeMode`, `RecurringSchedule`                           |
//! | [`occasion`]  | `Occasion`, `EnabledRange`, `OccasionQuery`               |
//! | [`error`]     | `ScheduleError`, `ScheduleResult<T>`                      |
//!
//! # Occasion model (summary)
//!
//! For a reference UTC instant `t` and a player at `utc_offset`:
//!
//! ```text
//! local      = t + (utc_offset if PlayerLocal else 0)
//! k          = floor((local - start) / recurrence), clamped to num_repeats - 1
//! occasion k = [start + k*recurrence, … + duration) shifted back to UTC
//! ```
//!
//! Pure integer arithmetic, no allocation, no clock reads.

pub mod error;
pub mod occasion;
pub mod schedule;

#[cfg(test)]
mod tests;

pub use error::{ScheduleError, ScheduleResult};
pub use occasion::{EnabledRange, Occasion, OccasionQuery};
pub use schedule::{RecurringSchedule, TimeMode};
