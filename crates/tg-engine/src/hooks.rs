//! Host callbacks fired by the orchestrator.

use tg_activable::{ActivableState, PlayerContext};

/// Side effects the host attaches to activation transitions.
///
/// Called by [`PlayerActivables`][crate::PlayerActivables] only after the
/// state machine accepted the transition, with the already updated state.
/// Both methods default to no-ops so implementors only override what they
/// care about.
///
/// # Example — grant and revoke an offer
///
/// ```rust,ignore
/// struct Inventory { offers: Vec<ActivableId> }
///
/// impl ActivationHooks for Inventory {
///     fn on_started_activation(&mut self, state: &ActivableState, _: &dyn PlayerContext) {
///         self.offers.push(state.id().clone());
///     }
///     fn on_finalized(&mut self, state: &ActivableState, _: &dyn PlayerContext) {
///         self.offers.retain(|id| id != state.id());
///     }
/// }
/// ```
pub trait ActivationHooks {
    /// A new activation was opened.  `state.latest()` is the new record.
    fn on_started_activation(&mut self, _state: &ActivableState, _player: &dyn PlayerContext) {}

    /// The latest activation was finalized.
    fn on_finalized(&mut self, _state: &ActivableState, _player: &dyn PlayerContext) {}
}

impl<H: ActivationHooks + ?Sized> ActivationHooks for &mut H {
    fn on_started_activation(&mut self, state: &ActivableState, player: &dyn PlayerContext) {
        (**self).on_started_activation(state, player);
    }

    fn on_finalized(&mut self, state: &ActivableState, player: &dyn PlayerContext) {
        (**self).on_finalized(state, player);
    }
}

/// [`ActivationHooks`] that do nothing.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopHooks;

impl ActivationHooks for NoopHooks {}
