//! `PlayerActivables`: one player's activables and the per-tick passes.

use tracing::debug;

use tg_activable::{
    ActivableDefinition, ActivableSet, ActivableState, Adjustment, DefinitionSet, PlayerContext,
    StartBlock, VisibleStatus, is_eligible, visible_status,
};
use tg_core::{ActivableId, Timestamp};

use crate::{ActivationHooks, NoopHooks};

// ── Reports ───────────────────────────────────────────────────────────────────

/// What one tick pass did, in processing order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    pub finalized: Vec<ActivableId>,
    pub started:   Vec<ActivableId>,
}

impl TickReport {
    pub fn is_empty(&self) -> bool {
        self.finalized.is_empty() && self.started.is_empty()
    }
}

/// Every change made by one config reconciliation, in definition order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub adjustments: Vec<(ActivableId, Adjustment)>,
}

impl ReconcileReport {
    pub fn is_empty(&self) -> bool {
        self.adjustments.is_empty()
    }

    /// Adjustments made to one activable.
    pub fn for_activable<'a, 'b>(&'a self, id: &'b ActivableId) -> impl Iterator<Item = &'a Adjustment> + use<'a, 'b> {
        self.adjustments.iter().filter(move |(a, _)| a == id).map(|(_, adj)| adj)
    }
}

// ── PlayerActivables ──────────────────────────────────────────────────────────

/// All activable state of one player, plus the host hooks.
///
/// Every method takes the definitions and `now` as arguments: the
/// orchestrator holds no config and reads no clock.  A state whose
/// definition is absent from the passed set is left untouched (and kept), so
/// an activable removed from config resumes with its history if it returns.
///
/// Create with [`PlayerActivables::new`] or, to restore persisted state,
/// [`PlayerActivablesBuilder`][crate::PlayerActivablesBuilder].
pub struct PlayerActivables<H: ActivationHooks = NoopHooks> {
    pub(crate) states: ActivableSet,
    pub(crate) hooks:  H,
}

impl<H: ActivationHooks> PlayerActivables<H> {
    pub fn new(hooks: H) -> Self {
        Self { states: ActivableSet::new(), hooks }
    }

    pub fn states(&self) -> &ActivableSet {
        &self.states
    }

    /// Release the state for persistence.
    pub fn into_states(self) -> ActivableSet {
        self.states
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn hooks_mut(&mut self) -> &mut H {
        &mut self.hooks
    }

    // ── Tick ──────────────────────────────────────────────────────────────

    /// Finalize every ended activation, then start every activable that can
    /// start, both in definition order.
    ///
    /// Finalizing first lets an activable with zero cooldown end and restart
    /// within one tick.
    pub fn tick<P: PlayerContext>(&mut self, defs: &DefinitionSet, player: &P, now: Timestamp) -> TickReport {
        self.run_passes(defs, |_| true, player, now)
    }

    /// Like [`tick`][Self::tick], restricted to `relevant` activables.  The
    /// processing order is still the definition order.
    pub fn tick_pass<P: PlayerContext>(
        &mut self,
        defs:     &DefinitionSet,
        relevant: &[ActivableId],
        player:   &P,
        now:      Timestamp,
    ) -> TickReport {
        self.run_passes(defs, |def| relevant.contains(&def.id), player, now)
    }

    fn run_passes<P, F>(&mut self, defs: &DefinitionSet, include: F, player: &P, now: Timestamp) -> TickReport
    where
        P: PlayerContext,
        F: Fn(&ActivableDefinition) -> bool,
    {
        let offset = player.utc_offset();
        let mut report = TickReport::default();

        // ── Pass 1: finalize ──────────────────────────────────────────────
        for def in defs.iter().filter(|d| include(d)) {
            let Some(state) = self.states.get_mut(&def.id) else {
                continue;
            };
            if state.try_finalize(def, now) {
                debug!(activable = %def.id, %now, cooldown_until = ?state.cooldown_until(), "finalized");
                self.hooks.on_finalized(state, player);
                report.finalized.push(def.id.clone());
            }
        }

        // ── Pass 2: start ─────────────────────────────────────────────────
        //
        // Eligibility is evaluated right before each start, so a precursor
        // finalized or started earlier in this tick is already visible.
        for def in defs.iter().filter(|d| include(d)) {
            let eligible = is_eligible(def, player, &self.states, now);
            let state = self.states.get_or_insert(&def.id);
            if state.try_start(def, eligible, offset, now) {
                let end_at = state.latest().and_then(|rec| rec.end_at);
                debug!(activable = %def.id, %now, sequence = state.num_activated(), ?end_at, "started");
                self.hooks.on_started_activation(state, player);
                report.started.push(def.id.clone());
            }
        }

        report
    }

    // ── Player actions ────────────────────────────────────────────────────

    /// Consume the running activation of `id` once.
    pub fn try_consume<P: PlayerContext>(
        &mut self,
        defs:    &DefinitionSet,
        id:      &ActivableId,
        _player: &P,
        now:     Timestamp,
    ) -> bool {
        let (Some(def), Some(state)) = (defs.get(id), self.states.get_mut(id)) else {
            return false;
        };
        let consumed = state.try_consume(def, now);
        if consumed {
            debug!(
                activable = %id,
                %now,
                in_activation = state.latest_num_consumed(),
                total = state.total_num_consumed(),
                "consumed"
            );
        }
        consumed
    }

    /// End the running activation of `id` now.  The next tick finalizes it.
    pub fn force_end_activation<P: PlayerContext>(
        &mut self,
        defs:    &DefinitionSet,
        id:      &ActivableId,
        _player: &P,
        now:     Timestamp,
    ) -> bool {
        let (Some(def), Some(state)) = (defs.get(id), self.states.get_mut(id)) else {
            return false;
        };
        let ended = state.force_end(def, now);
        if ended {
            debug!(activable = %id, %now, "force-ended");
        }
        ended
    }

    // ── Config change ─────────────────────────────────────────────────────

    /// Reconcile every existing state that has a definition in `new_defs`.
    ///
    /// Call once when swapping in a new config, before the next tick.
    /// Calling it again with the same inputs reports nothing.
    pub fn reconcile_after_config_change<P: PlayerContext>(
        &mut self,
        new_defs: &DefinitionSet,
        player:   &P,
        now:      Timestamp,
    ) -> ReconcileReport {
        let offset = player.utc_offset();
        let mut report = ReconcileReport::default();
        for def in new_defs {
            let Some(state) = self.states.get_mut(&def.id) else {
                continue;
            };
            report
                .adjustments
                .extend(state.reconcile(def, offset, now).into_iter().map(|adj| (def.id.clone(), adj)));
        }
        debug!(%now, adjustments = report.adjustments.len(), "config reconciled");
        report
    }

    // ── Queries ───────────────────────────────────────────────────────────

    pub fn is_active(&self, id: &ActivableId, now: Timestamp) -> bool {
        self.states.get(id).is_some_and(|s| s.is_active(now))
    }

    pub fn is_in_cooldown(&self, id: &ActivableId, now: Timestamp) -> bool {
        self.states.get(id).is_some_and(|s| s.is_in_cooldown(now))
    }

    /// Why `id` could not start at `now`, or `None` if the next tick would
    /// start it.  An unknown definition reports `Ineligible`.
    pub fn start_block<P: PlayerContext>(
        &self,
        defs:   &DefinitionSet,
        id:     &ActivableId,
        player: &P,
        now:    Timestamp,
    ) -> Option<StartBlock> {
        let Some(def) = defs.get(id) else {
            return Some(StartBlock::Ineligible);
        };
        let eligible = is_eligible(def, player, &self.states, now);
        match self.states.get(id) {
            Some(state) => state.start_block(def, eligible, player.utc_offset(), now),
            None => ActivableState::new(id.clone()).start_block(def, eligible, player.utc_offset(), now),
        }
    }

    pub fn can_start_activation<P: PlayerContext>(
        &self,
        defs:   &DefinitionSet,
        id:     &ActivableId,
        player: &P,
        now:    Timestamp,
    ) -> bool {
        self.start_block(defs, id, player, now).is_none()
    }

    /// `None` when `id` has no definition.
    pub fn try_get_visible_status<P: PlayerContext>(
        &self,
        defs:   &DefinitionSet,
        id:     &ActivableId,
        player: &P,
        now:    Timestamp,
    ) -> Option<VisibleStatus> {
        let def = defs.get(id)?;
        let eligible = is_eligible(def, player, &self.states, now);
        Some(visible_status(def, self.states.get(id), eligible, player.utc_offset(), now))
    }

    /// States with a running activation, in id order.
    pub fn active_states(&self, now: Timestamp) -> impl Iterator<Item = &ActivableState> + '_ {
        self.states.iter().map(|(_, s)| s).filter(move |s| s.is_active(now))
    }

    pub fn try_get_state(&self, id: &ActivableId) -> Option<&ActivableState> {
        self.states.get(id)
    }

    pub fn num_activated(&self, id: &ActivableId) -> u32 {
        self.states.get(id).map_or(0, |s| s.num_activated())
    }

    pub fn total_num_consumed(&self, id: &ActivableId) -> u32 {
        self.states.get(id).map_or(0, |s| s.total_num_consumed())
    }

    pub fn latest_num_consumed(&self, id: &ActivableId) -> u32 {
        self.states.get(id).map_or(0, |s| s.latest_num_consumed())
    }
}

impl Default for PlayerActivables<NoopHooks> {
    fn default() -> Self {
        Self::new(NoopHooks)
    }
}
