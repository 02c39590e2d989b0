//! Activation state machine: start, consume, finalize, force-end.
//!
//! Every transition takes `now` explicitly and touches nothing but the one
//! `ActivableState`, so the same call sequence yields bit-identical state on
//! every machine.  Host side effects (granting the payload on start, cleaning
//! up on finalize) are the orchestrator's job; these methods only report
//! success.
//!
//! # Ending vs. finalizing
//!
//! An activation *ends* the moment its `end_at` is reached, or immediately
//! when a consumption exhausts a consume limit.  From then on it is no longer
//! active and its cooldown applies.  It is *finalized* by the next tick's
//! finalize pass, which fires the host hook.  A new activation can only start
//! once the previous one is finalized, which is why each tick finalizes
//! everything before starting anything.

use tracing::trace;

use tg_core::{Span, Timestamp};
use tg_schedule::Occasion;

use crate::{ActivableDefinition, ActivableState, ActivationRecord, Cooldown, EndReason, Lifetime};

/// Why an activation cannot start right now.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StartBlock {
    /// An activation is already running.
    Active,
    /// The previous activation's cooldown has not elapsed.
    Cooldown,
    /// Disabled, audience mismatch, or an unmet precondition.
    Ineligible,
    /// `max_activations` reached.
    ActivationLimit,
    /// `max_total_consumes` reached.
    ConsumeLimit,
    /// The schedule has no enabled occasion at this instant.
    OutsideSchedule,
    /// The current occasion is blocked after a time-mode switch.
    ScheduleOffsetBlocked,
}

impl ActivableState {
    // ── Queries ───────────────────────────────────────────────────────────

    /// `true` while the latest activation has not reached its end.
    pub fn is_active(&self, now: Timestamp) -> bool {
        match &self.latest {
            Some(rec) => !self.latest_finalized && !rec.has_ended(now),
            None => false,
        }
    }

    /// `true` after an activation ended and before its cooldown is over.
    /// Never true at the same time as [`is_active`][Self::is_active].
    pub fn is_in_cooldown(&self, now: Timestamp) -> bool {
        self.latest.is_some()
            && !self.is_active(now)
            && self.cooldown_until.is_some_and(|until| now < until)
    }

    /// `true` if the latest activation has ended but not been finalized.
    pub fn has_pending_finalize(&self, now: Timestamp) -> bool {
        !self.latest_finalized && self.latest.as_ref().is_some_and(|rec| rec.has_ended(now))
    }

    /// First reason an activation could not start at `now`, or `None` if it
    /// could.  `eligible` is the result of [`crate::is_eligible`].
    ///
    /// A pending finalize is not a block here: the next tick finalizes before
    /// it starts anything.
    pub fn start_block(
        &self,
        def:        &ActivableDefinition,
        eligible:   bool,
        utc_offset: Span,
        now:        Timestamp,
    ) -> Option<StartBlock> {
        if self.is_active(now) {
            return Some(StartBlock::Active);
        }
        if self.is_in_cooldown(now) {
            return Some(StartBlock::Cooldown);
        }
        if !eligible {
            return Some(StartBlock::Ineligible);
        }
        if def.activation_limit_reached(self.num_activated) {
            return Some(StartBlock::ActivationLimit);
        }
        if def.total_consume_limit_reached(self.total_num_consumed) {
            return Some(StartBlock::ConsumeLimit);
        }
        if def.schedule.is_some() {
            if let Err(block) = self.startable_occasion(def, utc_offset, now) {
                return Some(block);
            }
        }
        None
    }

    // ── Transitions ───────────────────────────────────────────────────────

    /// Open a new activation if nothing blocks it.
    ///
    /// The end instant follows the lifetime: none for `Forever`, `now + d`
    /// for `Fixed`, the occasion's enabled end for `ScheduleBound`.
    pub fn try_start(
        &mut self,
        def:        &ActivableDefinition,
        eligible:   bool,
        utc_offset: Span,
        now:        Timestamp,
    ) -> bool {
        if self.has_pending_finalize(now) {
            trace!(activable = %self.id, "start blocked: previous activation not finalized");
            return false;
        }
        if let Some(block) = self.start_block(def, eligible, utc_offset, now) {
            trace!(activable = %self.id, ?block, "start blocked");
            return false;
        }

        let occasion = match def.schedule {
            Some(_) => self.startable_occasion(def, utc_offset, now).ok().flatten(),
            None => None,
        };
        let end_at = match def.lifetime {
            Lifetime::Forever => None,
            Lifetime::Fixed(duration) => Some(now + duration),
            Lifetime::ScheduleBound => match occasion {
                Some(occ) => Some(occ.enabled_end),
                None => return false,
            },
        };

        self.num_activated += 1;
        self.latest = Some(ActivationRecord {
            sequence: self.num_activated,
            started_at: now,
            end_at,
            num_consumed: 0,
            last_consumed_at: None,
            ended_by: None,
            occasion,
        });
        self.latest_finalized = false;
        if self.schedule_time_mode.is_none() {
            self.schedule_time_mode = def.schedule.as_ref().map(|s| s.time_mode);
        }
        self.cooldown_until = self.derive_cooldown_until(def);

        // Limits are left out: a config change without adjustment may leave
        // the counts above the current definition's limits.
        debug_assert_eq!(self.invariant_violation(None), None);
        true
    }

    /// Consume the running activation once.
    ///
    /// When this makes a consume limit exactly reached the activation ends at
    /// `now`, without waiting for the next tick, and goes straight to
    /// cooldown; no review phase follows a consumed-out activation.
    pub fn try_consume(&mut self, def: &ActivableDefinition, now: Timestamp) -> bool {
        if !self.is_active(now) {
            return false;
        }
        let Some(rec) = self.latest.as_mut() else {
            return false;
        };
        if def.activation_consume_limit_reached(rec.num_consumed)
            || def.total_consume_limit_reached(self.total_num_consumed)
        {
            return false;
        }

        rec.num_consumed += 1;
        rec.last_consumed_at = Some(now);
        self.total_num_consumed += 1;
        self.last_consumed_at = Some(now);

        if def.activation_consume_limit_reached(rec.num_consumed)
            || def.total_consume_limit_reached(self.total_num_consumed)
        {
            rec.end(now, now, Some(EndReason::ConsumeLimit));
        }
        self.cooldown_until = self.derive_cooldown_until(def);

        debug_assert_eq!(self.invariant_violation(None), None);
        true
    }

    /// Mark an ended activation as finalized and settle its cooldown.
    ///
    /// Returns `false` if nothing is due: no activation, still running, or
    /// already finalized.
    pub fn try_finalize(&mut self, def: &ActivableDefinition, now: Timestamp) -> bool {
        if !self.has_pending_finalize(now) {
            return false;
        }
        self.latest_finalized = true;
        self.cooldown_until = self.derive_cooldown_until(def);
        true
    }

    /// End the running activation at `now`.  The next tick finalizes it.
    pub fn force_end(&mut self, def: &ActivableDefinition, now: Timestamp) -> bool {
        if !self.is_active(now) {
            return false;
        }
        let Some(rec) = self.latest.as_mut() else {
            return false;
        };
        rec.end(now, now, Some(EndReason::Forced));
        self.cooldown_until = self.derive_cooldown_until(def);
        true
    }

    // ── Helpers ───────────────────────────────────────────────────────────

    /// The enabled occasion a start at `now` would fall in.
    ///
    /// `Ok(None)` only when the definition has no schedule.
    pub(crate) fn startable_occasion(
        &self,
        def:        &ActivableDefinition,
        utc_offset: Span,
        now:        Timestamp,
    ) -> Result<Option<Occasion>, StartBlock> {
        let Some(schedule) = &def.schedule else {
            return Ok(None);
        };
        let Some(current) = schedule.query_occasions(now, utc_offset).current else {
            return Err(StartBlock::OutsideSchedule);
        };
        if self.schedule_offset_blocked_until.is_some_and(|until| now < until) {
            return Err(StartBlock::ScheduleOffsetBlocked);
        }
        Ok(Some(current))
    }

    /// Cooldown end for the latest activation under `def`.
    ///
    /// * `Fixed(d)`      — `end + d`.
    /// * `ScheduleBound` — review end of the activation's occasion, evaluated
    ///   against the *current* schedule with the UTC offset captured at
    ///   start, never before the activation's end; `None` once the limits
    ///   rule out any further activation.
    ///
    /// `None` while the activation has no end yet.
    pub(crate) fn derive_cooldown_until(&self, def: &ActivableDefinition) -> Option<Timestamp> {
        let rec = self.latest.as_ref()?;
        let end = rec.end_at?;
        match def.cooldown {
            Cooldown::Fixed(duration) => Some(end + duration),
            Cooldown::ScheduleBound => {
                if def.activation_limit_reached(self.num_activated)
                    || def.total_consume_limit_reached(self.total_num_consumed)
                {
                    return None;
                }
                let captured = rec.occasion?;
                let occasion = def.schedule.as_ref()?.occasion(captured.index, captured.utc_offset)?;
                Some(occasion.review_end.max(end))
            }
        }
    }
}
