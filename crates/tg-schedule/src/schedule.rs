//! `RecurringSchedule` — the calendar definition of an activable's occasions.
//!
//! # Occasion model
//!
//! A schedule describes a sequence of *occasions*.  Occasion `k` starts at
//!
//! ```text
//! enabled_start(k) = start + k * recurrence        for k in [0, num_repeats)
//! ```
//!
//! in the schedule's own clock, and every occasion shares the same shape:
//!
//! ```text
//!   preview_start    enabled_start    ending_soon_start    enabled_end    review_end
//!        |── preview ──|──────── duration ────────────────────|── review ──|
//!                                          |── ending_soon ───|
//! ```
//!
//! A schedule without a recurrence has exactly one occasion.  A recurring
//! schedule without `num_repeats` repeats forever.
//!
//! # Time modes
//!
//! `TimeMode::Utc` evaluates boundaries against UTC.  `TimeMode::PlayerLocal`
//! evaluates them against the player's local clock (`UTC + utc_offset`), so
//! "10:30" means 10:30 wherever the player is.  Every boundary this crate
//! returns is converted back to a UTC `Timestamp`; callers never see local
//! instants.

use tg_core::{Span, Timestamp};

use crate::{Occasion, OccasionQuery, ScheduleError, ScheduleResult};

// ── TimeMode ──────────────────────────────────────────────────────────────────

/// Which clock a schedule's boundaries are expressed in.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TimeMode {
    Utc,
    PlayerLocal,
}

impl TimeMode {
    /// Offset from UTC to this mode's clock for a player at `utc_offset`.
    #[inline]
    pub fn clock_offset(self, utc_offset: Span) -> Span {
        match self {
            TimeMode::Utc => Span::ZERO,
            TimeMode::PlayerLocal => utc_offset,
        }
    }
}

// ── RecurringSchedule ─────────────────────────────────────────────────────────

/// A (possibly recurring) calendar schedule.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RecurringSchedule {
    pub time_mode: TimeMode,

    /// Enabled start of the first occasion, in the schedule's clock.
    pub start: Timestamp,

    /// Length of each occasion's enabled range.
    pub duration: Span,

    /// How long before `enabled_start` the occasion is announced.
    pub preview: Span,

    /// How long before `enabled_end` the occasion is flagged as ending soon.
    pub ending_soon: Span,

    /// How long after `enabled_end` the occasion stays visible.
    pub review: Span,

    /// Period between occasion starts.  `None` = a single occasion.
    pub recurrence: Option<Span>,

    /// Number of occasions.  `None` with a recurrence = repeat forever.
    pub num_repeats: Option<u32>,
}

impl RecurringSchedule {
    /// A single, non-recurring occasion with no preview/ending-soon/review.
    pub fn once(time_mode: TimeMode, start: Timestamp, duration: Span) -> Self {
        Self {
            time_mode,
            start,
            duration,
            preview: Span::ZERO,
            ending_soon: Span::ZERO,
            review: Span::ZERO,
            recurrence: None,
            num_repeats: None,
        }
    }

    /// Check the shape constraints the occasion arithmetic relies on.
    pub fn validate(&self) -> ScheduleResult<()> {
        for (field, value) in [
            ("duration", self.duration),
            ("preview", self.preview),
            ("ending_soon", self.ending_soon),
            ("review", self.review),
        ] {
            if value.is_negative() {
                return Err(ScheduleError::NegativeSpan { field, value });
            }
        }
        match self.recurrence {
            Some(recurrence) => {
                if !recurrence.is_positive() {
                    return Err(ScheduleError::NonPositiveRecurrence(recurrence));
                }
                // Occasions may touch but never overlap.
                if self.duration > recurrence {
                    return Err(ScheduleError::DurationExceedsRecurrence {
                        duration: self.duration,
                        recurrence,
                    });
                }
            }
            None => {
                if self.num_repeats.is_some_and(|n| n > 1) {
                    return Err(ScheduleError::RepeatsWithoutRecurrence);
                }
            }
        }
        if self.num_repeats == Some(0) {
            return Err(ScheduleError::ZeroRepeats);
        }
        Ok(())
    }

    /// Total number of occasions, or `None` if the schedule repeats forever.
    pub fn occasion_count(&self) -> Option<u32> {
        match self.recurrence {
            None => Some(1),
            Some(_) => self.num_repeats,
        }
    }

    /// Occasion `index` in this schedule's own time mode.
    #[inline]
    pub fn occasion(&self, index: u32, utc_offset: Span) -> Option<Occasion> {
        self.occasion_in_mode(index, self.time_mode, utc_offset)
    }

    /// Occasion `index` as it would be if the schedule used `mode`.
    ///
    /// Reconciliation uses this to see where an occasion *was* before a
    /// time-mode switch.  Returns `None` past the last repeat.
    pub fn occasion_in_mode(&self, index: u32, mode: TimeMode, utc_offset: Span) -> Option<Occasion> {
        if self.occasion_count().is_some_and(|n| index >= n) {
            return None;
        }
        let period = self.recurrence.unwrap_or(Span::ZERO);
        let local_start = self.start + period * index as i64;
        let to_utc = mode.clock_offset(utc_offset);

        let enabled_start = local_start - to_utc;
        let enabled_end = enabled_start + self.duration;
        let ending_soon_start = (enabled_end - self.ending_soon).max(enabled_start);

        Some(Occasion {
            index,
            time_mode: mode,
            utc_offset,
            preview_start: enabled_start - self.preview,
            enabled_start,
            ending_soon_start,
            enabled_end,
            review_end: enabled_end + self.review,
        })
    }

    /// Previous, current and next occasions relative to UTC instant `t`.
    ///
    /// * `current`  — the occasion whose enabled range `[start, end)` holds `t`.
    /// * `previous` — the latest occasion whose enabled range ended at or before `t`.
    /// * `next`     — the earliest occasion starting after `t`.
    ///
    /// O(1): the candidate index is computed directly from the period.
    pub fn query_occasions(&self, t: Timestamp, utc_offset: Span) -> OccasionQuery {
        let local = t + self.time_mode.clock_offset(utc_offset);
        if local < self.start {
            return OccasionQuery {
                previous: None,
                current: None,
                next: self.occasion(0, utc_offset),
            };
        }

        let index = self.latest_started_index(local);
        // Invariant: local >= self.start, so occasion `index` exists.
        let Some(latest) = self.occasion(index, utc_offset) else {
            return OccasionQuery::default();
        };
        let next = index.checked_add(1).and_then(|i| self.occasion(i, utc_offset));

        if t < latest.enabled_end {
            let previous = index.checked_sub(1).and_then(|i| self.occasion(i, utc_offset));
            OccasionQuery { previous, current: Some(latest), next }
        } else {
            OccasionQuery { previous: Some(latest), current: None, next }
        }
    }

    /// Index of the last occasion whose enabled start is `<= local`, clamped
    /// to the final repeat.  Requires `local >= self.start`.
    fn latest_started_index(&self, local: Timestamp) -> u32 {
        let Some(period) = self.recurrence else {
            return 0;
        };
        let elapsed = (local - self.start).as_millis();
        let raw = (elapsed / period.as_millis()).min(u32::MAX as i64) as u32;
        match self.occasion_count() {
            Some(n) => raw.min(n - 1),
            None => raw,
        }
    }
}
