//! Bring one state in line with a changed definition.
//!
//! Reconciliation re-derives the open activation's end, the cooldown and the
//! schedule block from the *new* definition instead of applying deltas, so
//! running it twice with the same inputs changes nothing the second time.
//! Ended activations are history: their start, end and occasion are never
//! touched; only the cooldown that follows them is recomputed.
//!
//! Order of checks for an open activation:
//!
//! 1. definition disabled → end now
//! 2. a limit now below the counts → end now
//! 3. lifetime re-derived (fixed span from the activation start, or the
//!    captured occasion under the new schedule) → move the end, or end it if
//!    the new end is already past
//!
//! Schedule-bound boundaries are recomputed with the UTC offset captured at
//! start, not the player's current one: an offset change alone never moves
//! a running activation or its cooldown.
//!
//! After that the cooldown is recomputed for any state with a record, and a
//! time-mode switch blocks the first occasion under the new mode.

use tracing::debug;

use tg_core::{Span, Timestamp};
use tg_schedule::{Occasion, TimeMode};

use crate::{ActivableDefinition, ActivableState, EndReason, Lifetime};

/// One change made by [`ActivableState::reconcile`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Adjustment {
    /// The open activation was ended.
    Ended { at: Timestamp, reason: EndReason },
    /// The open activation's end instant moved (`None` = no end).
    EndMoved { from: Option<Timestamp>, to: Option<Timestamp> },
    /// A schedule-bound activation now belongs to a different occasion.
    OccasionMoved { from: Option<Occasion>, to: Occasion },
    CooldownChanged { from: Option<Timestamp>, to: Option<Timestamp> },
    /// A time-mode switch blocked occasion `index` until `until`.
    ScheduleOffsetBlocked { index: u32, until: Timestamp },
}

impl ActivableState {
    /// Reconcile this state against `def`, the definition after a config
    /// change.  Returns what changed; empty when nothing did, and always
    /// empty when `def.allow_adjustment` is off.
    pub fn reconcile(
        &mut self,
        def:        &ActivableDefinition,
        utc_offset: Span,
        now:        Timestamp,
    ) -> Vec<Adjustment> {
        let mut adjustments = Vec::new();
        if !def.allow_adjustment {
            return adjustments;
        }

        if self.is_active(now) {
            self.reconcile_open_activation(def, utc_offset, now, &mut adjustments);
        }

        let cooldown = self.derive_cooldown_until(def);
        if cooldown != self.cooldown_until {
            adjustments.push(Adjustment::CooldownChanged { from: self.cooldown_until, to: cooldown });
            self.cooldown_until = cooldown;
        }

        self.reconcile_time_mode(def, utc_offset, now, &mut adjustments);

        if !adjustments.is_empty() {
            debug!(activable = %self.id, ?adjustments, "reconciled");
        }
        debug_assert_eq!(self.invariant_violation(None), None);
        adjustments
    }

    fn reconcile_open_activation(
        &mut self,
        def:         &ActivableDefinition,
        utc_offset:  Span,
        now:         Timestamp,
        adjustments: &mut Vec<Adjustment>,
    ) {
        let Some(rec) = self.latest.as_mut() else {
            return;
        };

        if !def.enabled {
            rec.end(now, now, Some(EndReason::Disabled));
            adjustments.push(Adjustment::Ended { at: now, reason: EndReason::Disabled });
            return;
        }

        let over_limit = def.max_activations.is_some_and(|max| self.num_activated > max)
            || def.activation_consume_limit_reached(rec.num_consumed)
            || def.total_consume_limit_reached(self.total_num_consumed);
        if over_limit {
            rec.end(now, now, Some(EndReason::LimitsReduced));
            adjustments.push(Adjustment::Ended { at: now, reason: EndReason::LimitsReduced });
            return;
        }

        match def.lifetime {
            Lifetime::Forever => {
                if rec.end_at.is_some() {
                    adjustments.push(Adjustment::EndMoved { from: rec.end_at, to: None });
                    rec.end_at = None;
                }
            }
            Lifetime::Fixed(duration) => {
                let end = rec.started_at + duration;
                if rec.end_at != Some(end) {
                    if end <= now {
                        rec.end(end, now, Some(EndReason::Reconfigured));
                        adjustments.push(Adjustment::Ended { at: end, reason: EndReason::Reconfigured });
                    } else {
                        adjustments.push(Adjustment::EndMoved { from: rec.end_at, to: Some(end) });
                        rec.end_at = Some(end);
                    }
                }
            }
            Lifetime::ScheduleBound => {
                let captured = rec.occasion;
                let offset = captured.map_or(utc_offset, |occ| occ.utc_offset);
                let current = def.schedule.as_ref().and_then(|schedule| {
                    captured
                        .and_then(|occ| schedule.occasion(occ.index, offset))
                        .filter(|occ| occ.is_enabled_at(now))
                        .or_else(|| schedule.query_occasions(now, offset).current)
                });
                match current {
                    Some(occ) => {
                        if rec.occasion != Some(occ) {
                            adjustments.push(Adjustment::OccasionMoved { from: rec.occasion, to: occ });
                            rec.occasion = Some(occ);
                        }
                        if rec.end_at != Some(occ.enabled_end) {
                            adjustments.push(Adjustment::EndMoved {
                                from: rec.end_at,
                                to:   Some(occ.enabled_end),
                            });
                            rec.end_at = Some(occ.enabled_end);
                        }
                    }
                    None => {
                        rec.end(now, now, Some(EndReason::Reconfigured));
                        adjustments.push(Adjustment::Ended { at: now, reason: EndReason::Reconfigured });
                    }
                }
            }
        }
    }

    /// Block the first occasion after a UTC ↔ player-local switch so the
    /// shifted calendar can't hand the player the same occasion twice, or
    /// one earlier than it would have started under the old mode.
    ///
    /// * The latest activation already used the target occasion → blocked
    ///   until that occasion's enabled end under the new mode.
    /// * Otherwise → blocked until the occasion's start under the old mode.
    ///
    /// Either way never before `now`; a block that would end at `now` is
    /// not recorded.
    fn reconcile_time_mode(
        &mut self,
        def:         &ActivableDefinition,
        utc_offset:  Span,
        now:         Timestamp,
        adjustments: &mut Vec<Adjustment>,
    ) {
        let new_mode = def.schedule.as_ref().map(|s| s.time_mode);
        if let (Some(old), Some(new), Some(schedule)) = (self.schedule_time_mode, new_mode, &def.schedule) {
            if old != new {
                if let Some(target) = schedule.query_occasions(now, utc_offset).current_or_next() {
                    let until = self.offset_block_until(old, target, schedule, utc_offset, now);
                    if until > now && self.schedule_offset_blocked_until.is_none_or(|b| b < until) {
                        self.schedule_offset_blocked_until = Some(until);
                        adjustments.push(Adjustment::ScheduleOffsetBlocked { index: target.index, until });
                    }
                }
            }
        }
        self.schedule_time_mode = new_mode;
    }

    // With a positive offset the old-mode start can fall after the whole
    // first local occasion, which then never opens for this player.  Blocking
    // only the overlap would allow a short reactivation instead.  Which of the
    // two is wanted is still an open question; this keeps the stricter one.
    fn offset_block_until(
        &self,
        old_mode:   TimeMode,
        target:     Occasion,
        schedule:   &tg_schedule::RecurringSchedule,
        utc_offset: Span,
        now:        Timestamp,
    ) -> Timestamp {
        let already_used = self
            .latest
            .as_ref()
            .and_then(|rec| rec.occasion)
            .is_some_and(|occ| occ.index == target.index);
        if already_used {
            return target.enabled_end.max(now);
        }
        schedule
            .occasion_in_mode(target.index, old_mode, utc_offset)
            .map_or(now, |old| old.enabled_start)
            .max(now)
    }
}
