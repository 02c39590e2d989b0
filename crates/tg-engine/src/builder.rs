//! Builder for restoring a [`PlayerActivables`] from persisted state.

use tg_activable::{ActivableSet, ActivableState};

use crate::{ActivationHooks, EngineError, EngineResult, NoopHooks, PlayerActivables};

/// Fluent builder for [`PlayerActivables<H>`].
///
/// | Method          | Default                 |
/// |-----------------|-------------------------|
/// | `.hooks(h)`     | [`NoopHooks`]           |
/// | `.states(set)`  | empty `ActivableSet`    |
/// | `.state(s)`     | (adds / replaces one)   |
///
/// # Example
///
/// ```rust,ignore
/// let saved: ActivableSet = serde_json::from_str(&blob)?;
/// let mut player = PlayerActivablesBuilder::new()
///     .hooks(Inventory::default())
///     .states(saved)
///     .build()?;
/// player.reconcile_after_config_change(&defs, &ctx, now);
/// ```
pub struct PlayerActivablesBuilder<H: ActivationHooks = NoopHooks> {
    hooks:  H,
    states: ActivableSet,
}

impl PlayerActivablesBuilder<NoopHooks> {
    pub fn new() -> Self {
        Self { hooks: NoopHooks, states: ActivableSet::new() }
    }
}

impl Default for PlayerActivablesBuilder<NoopHooks> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: ActivationHooks> PlayerActivablesBuilder<H> {
    /// Replace the hooks.
    pub fn hooks<H2: ActivationHooks>(self, hooks: H2) -> PlayerActivablesBuilder<H2> {
        PlayerActivablesBuilder { hooks, states: self.states }
    }

    /// Start from a previously saved set.
    pub fn states(mut self, states: ActivableSet) -> Self {
        self.states = states;
        self
    }

    /// Add one restored state, replacing any with the same id.
    pub fn state(mut self, state: ActivableState) -> Self {
        self.states.insert(state);
        self
    }

    /// Check every restored state's structural invariants and build.
    ///
    /// Limits are not checked here: a config change may legitimately have
    /// lowered them below the saved counts, which reconciliation handles.
    pub fn build(self) -> EngineResult<PlayerActivables<H>> {
        for (id, state) in self.states.iter() {
            if let Some(reason) = state.invariant_violation(None) {
                return Err(EngineError::CorruptState { id: id.clone(), reason });
            }
        }
        Ok(PlayerActivables { states: self.states, hooks: self.hooks })
    }
}
