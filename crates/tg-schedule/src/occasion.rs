//! Concrete occasions and the result of an occasion query.

use tg_core::{Span, Timestamp};

use crate::TimeMode;

/// A half-open `[start, end)` range during which an occasion is enabled.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnabledRange {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl EnabledRange {
    #[inline]
    pub fn contains(&self, t: Timestamp) -> bool {
        self.start <= t && t < self.end
    }
}

/// One concrete repeat of a schedule, with all boundaries in UTC.
///
/// Activation records keep a copy of the occasion they started in, so later
/// edits to the schedule (or to the player's UTC offset) never rewrite a
/// concluded activation's boundaries.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Occasion {
    /// Repeat number `k`, starting at 0.
    pub index: u32,
    /// Time mode the boundaries were computed in.
    pub time_mode: TimeMode,
    /// Player UTC offset the boundaries were computed with.  Recomputing
    /// occasion `index` with this offset reproduces the same boundaries
    /// while the schedule is unchanged, whatever the player's offset is now.
    pub utc_offset: Span,
    pub preview_start: Timestamp,
    pub enabled_start: Timestamp,
    pub ending_soon_start: Timestamp,
    /// Also the start of the review phase.
    pub enabled_end: Timestamp,
    pub review_end: Timestamp,
}

impl Occasion {
    #[inline]
    pub fn enabled_range(&self) -> EnabledRange {
        EnabledRange { start: self.enabled_start, end: self.enabled_end }
    }

    #[inline]
    pub fn is_enabled_at(&self, t: Timestamp) -> bool {
        self.enabled_range().contains(t)
    }

    /// `true` during `[preview_start, enabled_start)`.
    #[inline]
    pub fn is_in_preview_at(&self, t: Timestamp) -> bool {
        self.preview_start <= t && t < self.enabled_start
    }

    /// `true` during `[enabled_end, review_end)`.
    #[inline]
    pub fn is_in_review_at(&self, t: Timestamp) -> bool {
        self.enabled_end <= t && t < self.review_end
    }

    /// `true` during `[ending_soon_start, enabled_end)`.
    #[inline]
    pub fn is_ending_soon_at(&self, t: Timestamp) -> bool {
        self.ending_soon_start <= t && t < self.enabled_end
    }
}

/// Occasions surrounding a reference instant.  See
/// [`RecurringSchedule::query_occasions`][crate::RecurringSchedule::query_occasions].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct OccasionQuery {
    pub previous: Option<Occasion>,
    pub current: Option<Occasion>,
    pub next: Option<Occasion>,
}

impl OccasionQuery {
    /// The current occasion, or failing that the next one.
    #[inline]
    pub fn current_or_next(&self) -> Option<Occasion> {
        self.current.or(self.next)
    }
}
