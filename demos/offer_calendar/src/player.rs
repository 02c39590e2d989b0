//! The simulated player: host context and inventory hooks.

use tracing::info;

use tg_activable::{ActivableState, PlayerContext};
use tg_core::{ActivableId, SegmentId, Span};
use tg_engine::ActivationHooks;

/// A player in one timezone and a fixed set of segments.
pub struct DemoPlayer {
    pub utc_offset: Span,
    pub segments:   Vec<SegmentId>,
}

impl PlayerContext for DemoPlayer {
    fn utc_offset(&self) -> Span {
        self.utc_offset
    }

    fn is_in_segment(&self, segment: &SegmentId) -> bool {
        self.segments.contains(segment)
    }
}

/// Grants an offer to the player's inventory while it is active.
#[derive(Default)]
pub struct Inventory {
    pub offers:      Vec<ActivableId>,
    pub grants:      usize,
    pub revocations: usize,
}

impl ActivationHooks for Inventory {
    fn on_started_activation(&mut self, state: &ActivableState, _player: &dyn PlayerContext) {
        info!(offer = %state.id(), activation = state.num_activated(), "offer granted");
        self.offers.push(state.id().clone());
        self.grants += 1;
    }

    fn on_finalized(&mut self, state: &ActivableState, _player: &dyn PlayerContext) {
        info!(offer = %state.id(), consumed = state.latest_num_consumed(), "offer revoked");
        self.offers.retain(|id| id != state.id());
        self.revocations += 1;
    }
}
