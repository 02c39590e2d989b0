//! Player-facing phase of an activable.
//!
//! The projection is read-only and precedence-ordered: the first matching
//! phase wins.
//!
//! | Phase        | When                                                        |
//! |--------------|-------------------------------------------------------------|
//! | `Active`     | an activation is running                                    |
//! | `EndingSoon` | … and its ending-soon instant has passed                    |
//! | `Tentative`  | nothing running, but an activation could start now          |
//! | `InReview`   | the activation's occasion is in its review phase            |
//! | `InPreview`  | the next occasion is in its preview phase and would start   |
//! | `None`       | nothing to show                                             |

use tg_core::{Span, Timestamp};
use tg_schedule::EnabledRange;

use crate::{ActivableDefinition, ActivableState, EndReason, Lifetime};

/// Details of a running activation.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActiveStatus {
    pub activation_started_at: Timestamp,
    pub ending_soon_starts_at: Option<Timestamp>,
    pub activation_ends_at: Option<Timestamp>,
    pub schedule_enabled_range: Option<EnabledRange>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VisibleStatus {
    Active(ActiveStatus),
    EndingSoon(ActiveStatus),
    /// Would start on the next tick.
    Tentative { schedule_enabled_range: Option<EnabledRange> },
    InReview {
        activation_ended_at: Timestamp,
        visibility_ends_at: Timestamp,
        schedule_enabled_range: EnabledRange,
    },
    InPreview { schedule_enabled_range: EnabledRange },
    None,
}

/// Project `state` (absent = never attempted) to its visible phase.
///
/// `eligible` is the result of [`crate::is_eligible`] for the same instant.
pub fn visible_status(
    def:        &ActivableDefinition,
    state:      Option<&ActivableState>,
    eligible:   bool,
    utc_offset: Span,
    now:        Timestamp,
) -> VisibleStatus {
    let fresh;
    let state = match state {
        Some(s) => s,
        None => {
            fresh = ActivableState::new(def.id.clone());
            &fresh
        }
    };

    if state.is_active(now) {
        if let Some(rec) = state.latest() {
            let ending_soon_starts_at = match def.lifetime {
                Lifetime::ScheduleBound => rec.occasion.map(|o| o.ending_soon_start),
                _ => match (rec.end_at, &def.schedule) {
                    (Some(end), Some(schedule)) => Some((end - schedule.ending_soon).max(rec.started_at)),
                    _ => None,
                },
            };
            let active = ActiveStatus {
                activation_started_at: rec.started_at,
                ending_soon_starts_at,
                activation_ends_at: rec.end_at,
                schedule_enabled_range: rec.occasion.map(|o| o.enabled_range()),
            };
            return if ending_soon_starts_at.is_some_and(|t| now >= t) {
                VisibleStatus::EndingSoon(active)
            } else {
                VisibleStatus::Active(active)
            };
        }
    }

    if state.start_block(def, eligible, utc_offset, now).is_none() {
        let schedule_enabled_range = def
            .schedule
            .as_ref()
            .and_then(|s| s.query_occasions(now, utc_offset).current)
            .map(|o| o.enabled_range());
        return VisibleStatus::Tentative { schedule_enabled_range };
    }

    if !def.enabled {
        return VisibleStatus::None;
    }
    let Some(schedule) = &def.schedule else {
        return VisibleStatus::None;
    };

    if let Some(rec) = state.latest() {
        let reviewable = rec.has_ended(now) && rec.ended_by != Some(EndReason::ConsumeLimit);
        if let (true, Some(end), Some(captured)) = (reviewable, rec.end_at, rec.occasion) {
            if let Some(occ) = schedule.occasion(captured.index, captured.utc_offset) {
                if occ.is_in_review_at(now) {
                    return VisibleStatus::InReview {
                        activation_ended_at: end,
                        visibility_ends_at: occ.review_end,
                        schedule_enabled_range: occ.enabled_range(),
                    };
                }
            }
        }
    }

    let exhausted = def.activation_limit_reached(state.num_activated())
        || def.total_consume_limit_reached(state.total_num_consumed());
    if eligible && !exhausted {
        if let Some(next) = schedule.query_occasions(now, utc_offset).next {
            if next.is_in_preview_at(now) {
                return VisibleStatus::InPreview { schedule_enabled_range: next.enabled_range() };
            }
        }
    }

    VisibleStatus::None
}
