//! Static eligibility: enabled ∧ audience ∧ all preconditions.
//!
//! Segment membership and host conditions are opaque to the engine; the
//! host answers them through [`PlayerContext`].  Precursor conditions are the
//! only ones evaluated here, against other activables' runtime state.

use tg_core::{ActivableId, ConditionKey, SegmentId, Span, Timestamp};

use crate::{ActivableDefinition, ActivableState, Precondition, Precursor, PrecursorKind};

/// The host's view of one player, as far as activation is concerned.
///
/// Implementations must be pure functions of the player's current state:
/// the engine may call them any number of times per tick.
pub trait PlayerContext {
    /// Current offset of the player's local clock from UTC.  Only
    /// `PlayerLocal` schedules use it.
    fn utc_offset(&self) -> Span {
        Span::ZERO
    }

    /// Whether the player currently belongs to `segment`.
    fn is_in_segment(&self, segment: &SegmentId) -> bool;

    /// Evaluate a host-defined precondition.  Default: satisfied.
    fn check_condition(&self, _key: &ConditionKey) -> bool {
        true
    }
}

/// Read access to other activables' runtime state, for precursor checks.
pub trait StateLookup {
    fn lookup(&self, id: &ActivableId) -> Option<&ActivableState>;
}

/// `true` if `def` is statically eligible for the player at `now`.
///
/// Does not look at the activable's own state (active, cooldown, limits,
/// schedule); see [`ActivableState::start_block`] for that.
pub fn is_eligible<P, L>(def: &ActivableDefinition, player: &P, states: &L, now: Timestamp) -> bool
where
    P: PlayerContext + ?Sized,
    L: StateLookup + ?Sized,
{
    def.enabled
        && audience_matches(&def.audience, player)
        && def.preconditions.iter().all(|pre| match pre {
            Precondition::Precursor(p) => precursor_satisfied(p, states, now),
            Precondition::Host(key) => player.check_condition(key),
        })
}

/// Empty audience matches everyone; otherwise any listed segment suffices.
pub fn audience_matches<P: PlayerContext + ?Sized>(audience: &[SegmentId], player: &P) -> bool {
    audience.is_empty() || audience.iter().any(|s| player.is_in_segment(s))
}

/// Evaluate a single precursor dependency.
///
/// * `Consumed`        — consumed at least once, `delay` after the latest consumption.
/// * `EndedUnconsumed` — latest activation ended with no consumption, `delay` after its end.
///
/// A precursor with no runtime state is never satisfied.
pub fn precursor_satisfied<L: StateLookup + ?Sized>(
    precursor: &Precursor,
    states:    &L,
    now:       Timestamp,
) -> bool {
    let Some(state) = states.lookup(&precursor.activable) else {
        return false;
    };
    match precursor.kind {
        PrecursorKind::Consumed => state
            .last_consumed_at()
            .is_some_and(|at| now >= at + precursor.delay),
        PrecursorKind::EndedUnconsumed => state.latest().is_some_and(|rec| {
            rec.num_consumed == 0
                && rec.has_ended(now)
                && rec.end_at.is_some_and(|end| now >= end + precursor.delay)
        }),
    }
}
