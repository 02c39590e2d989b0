//! Per-player runtime state: `ActivationRecord`, `ActivableState`, and the
//! `ActivableSet` that holds one state per activable.
//!
//! # Lifecycle
//!
//! ```text
//! Inactive ──try_start──▶ Active ──end reached / consumed out──▶ ended
//!    ▲                                                            │
//!    └────── cooldown over ◀── Cooldown ◀──────try_finalize───────┘
//! ```
//!
//! A state is created lazily on the first activation attempt and is never
//! removed: counters and history outlive the definition, so a definition that
//! disappears from config and later comes back picks up where it left off.
//!
//! State mutation only happens through the methods in
//! [`machine`][crate::machine] and [`reconcile`][crate::reconcile]; fields are
//! read through accessors so the invariants below cannot be broken from
//! outside the crate.

use std::collections::BTreeMap;

use tg_core::{ActivableId, Timestamp};
use tg_schedule::{Occasion, TimeMode};

use crate::{ActivableDefinition, StateLookup};

// ── EndReason ─────────────────────────────────────────────────────────────────

/// Why an activation ended before its lifetime ran out.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EndReason {
    /// A consumption made a consume limit exactly reached.
    ConsumeLimit,
    /// The host ended it explicitly.
    Forced,
    /// The definition was disabled by a config change.
    Disabled,
    /// A config change lowered a limit below the current counts.
    LimitsReduced,
    /// A config change moved the lifetime or schedule so it no longer covers now.
    Reconfigured,
}

// ── ActivationRecord ──────────────────────────────────────────────────────────

/// One activation of an activable.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActivationRecord {
    /// 1-based: the n-th activation of this activable for this player.
    pub sequence: u32,
    pub started_at: Timestamp,
    /// `None` while a `Forever` activation is open.  Once `<= now` the record
    /// has ended and this value is frozen.
    pub end_at: Option<Timestamp>,
    pub num_consumed: u32,
    pub last_consumed_at: Option<Timestamp>,
    /// `None` when the activation ran its natural course.
    pub ended_by: Option<EndReason>,
    /// Occasion in effect at start, when the definition had a schedule.
    pub occasion: Option<Occasion>,
}

impl ActivationRecord {
    /// `true` once `end_at` is at or before `now`.
    #[inline]
    pub fn has_ended(&self, now: Timestamp) -> bool {
        self.end_at.is_some_and(|end| end <= now)
    }

    /// Set the end instant.  Only legal while the record is still open.
    pub(crate) fn end(&mut self, at: Timestamp, now: Timestamp, reason: Option<EndReason>) {
        debug_assert!(!self.has_ended(now), "ended activation must not be re-ended");
        self.end_at = Some(at);
        self.ended_by = reason;
    }
}

// ── ActivableState ────────────────────────────────────────────────────────────

/// Runtime state of one activable for one player.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActivableState {
    pub(crate) id: ActivableId,
    pub(crate) num_activated: u32,
    pub(crate) total_num_consumed: u32,
    pub(crate) last_consumed_at: Option<Timestamp>,
    pub(crate) latest: Option<ActivationRecord>,
    pub(crate) latest_finalized: bool,
    pub(crate) cooldown_until: Option<Timestamp>,
    /// Occasions starting before this instant are ignored; set when a time
    /// mode switch would otherwise re-trigger an occasion.
    pub(crate) schedule_offset_blocked_until: Option<Timestamp>,
    /// Schedule time mode this state last observed.
    pub(crate) schedule_time_mode: Option<TimeMode>,
}

impl ActivableState {
    pub fn new(id: ActivableId) -> Self {
        Self {
            id,
            num_activated: 0,
            total_num_consumed: 0,
            last_consumed_at: None,
            latest: None,
            latest_finalized: false,
            cooldown_until: None,
            schedule_offset_blocked_until: None,
            schedule_time_mode: None,
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn id(&self) -> &ActivableId {
        &self.id
    }

    pub fn num_activated(&self) -> u32 {
        self.num_activated
    }

    pub fn total_num_consumed(&self) -> u32 {
        self.total_num_consumed
    }

    /// Instant of the most recent consumption across all activations.
    pub fn last_consumed_at(&self) -> Option<Timestamp> {
        self.last_consumed_at
    }

    pub fn latest(&self) -> Option<&ActivationRecord> {
        self.latest.as_ref()
    }

    /// Consumptions within the latest activation (0 if never activated).
    pub fn latest_num_consumed(&self) -> u32 {
        self.latest.as_ref().map_or(0, |r| r.num_consumed)
    }

    pub fn is_latest_finalized(&self) -> bool {
        self.latest_finalized
    }

    pub fn cooldown_until(&self) -> Option<Timestamp> {
        self.cooldown_until
    }

    pub fn schedule_offset_blocked_until(&self) -> Option<Timestamp> {
        self.schedule_offset_blocked_until
    }

    pub fn schedule_time_mode(&self) -> Option<TimeMode> {
        self.schedule_time_mode
    }

    // ── Invariants ────────────────────────────────────────────────────────

    /// First violated invariant, if any.  `def` adds the limit checks.
    ///
    /// A violation means an engine defect, never bad input; the mutators
    /// `debug_assert!` on it.
    pub fn invariant_violation(&self, def: Option<&ActivableDefinition>) -> Option<&'static str> {
        if let Some(rec) = &self.latest {
            if rec.sequence != self.num_activated {
                return Some("latest record sequence differs from activation count");
            }
            if rec.num_consumed > self.total_num_consumed {
                return Some("activation consumed more than the total");
            }
            if let Some(end) = rec.end_at {
                if end < rec.started_at {
                    return Some("activation ends before it starts");
                }
            }
            if self.latest_finalized && rec.end_at.is_none() {
                return Some("finalized activation has no end");
            }
        } else {
            if self.num_activated != 0 || self.latest_finalized {
                return Some("activation history without a record");
            }
            if self.total_num_consumed != 0 {
                return Some("consumptions without an activation");
            }
        }

        if let Some(def) = def {
            if def.max_activations.is_some_and(|max| self.num_activated > max) {
                return Some("activation count above max_activations");
            }
            if def.max_total_consumes.is_some_and(|max| self.total_num_consumed > max) {
                return Some("total consumption above max_total_consumes");
            }
            if def.max_consumes_per_activation.is_some_and(|max| self.latest_num_consumed() > max) {
                return Some("activation consumption above max_consumes_per_activation");
            }
        }
        None
    }
}

// ── ActivableSet ──────────────────────────────────────────────────────────────

/// Every activable state of one player, keyed by activable id.
///
/// A `BTreeMap` keeps iteration order stable across machines; per-tick passes
/// iterate the *definition* order instead, so this order only matters for
/// reporting and persistence.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActivableSet {
    states: BTreeMap<ActivableId, ActivableState>,
}

impl ActivableSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &ActivableId) -> Option<&ActivableState> {
        self.states.get(id)
    }

    pub fn get_mut(&mut self, id: &ActivableId) -> Option<&mut ActivableState> {
        self.states.get_mut(id)
    }

    /// The state for `id`, created empty on first access.
    pub fn get_or_insert(&mut self, id: &ActivableId) -> &mut ActivableState {
        self.states
            .entry(id.clone())
            .or_insert_with(|| ActivableState::new(id.clone()))
    }

    /// Insert a restored state, replacing any existing one with the same id.
    pub fn insert(&mut self, state: ActivableState) -> Option<ActivableState> {
        self.states.insert(state.id.clone(), state)
    }

    pub fn contains(&self, id: &ActivableId) -> bool {
        self.states.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ActivableId, &ActivableState)> {
        self.states.iter()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

impl StateLookup for ActivableSet {
    fn lookup(&self, id: &ActivableId) -> Option<&ActivableState> {
        self.states.get(id)
    }
}
