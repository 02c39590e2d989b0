//! Activable definitions: the immutable, versioned configuration side.
//!
//! A definition says *when* an activable may be active for a player and how
//! often.  It never holds per-player data; that lives in
//! [`ActivableState`][crate::ActivableState].  A config hot-reload produces a
//! new [`DefinitionSet`] which the host hands to the reconciler.

use rustc_hash::FxHashMap;

use tg_core::{ActivableId, ConditionKey, SegmentId, Span};
use tg_schedule::RecurringSchedule;

use crate::{ActivableError, ActivableResult};

// ── Lifetime / Cooldown ───────────────────────────────────────────────────────

/// How long one activation lasts once started.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Lifetime {
    /// Active until consumed out or forcibly ended.
    Forever,
    /// Active for a fixed span after the start.
    Fixed(Span),
    /// Active until the enabled range of the occasion it started in ends.
    ScheduleBound,
}

/// How long after an activation ends before the next may start.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Cooldown {
    /// A fixed span after the activation's end.
    Fixed(Span),
    /// Until the review phase of the activation's occasion is over.
    ScheduleBound,
}

// ── Preconditions ─────────────────────────────────────────────────────────────

/// Which part of a precursor's history satisfies the dependency.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PrecursorKind {
    /// The precursor has been consumed at least once.
    Consumed,
    /// The precursor's latest activation ended without a consumption.
    EndedUnconsumed,
}

/// Dependency on another activable's activation history.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Precursor {
    pub activable: ActivableId,
    pub kind: PrecursorKind,
    /// Minimum time since the triggering consumption / end.
    pub delay: Span,
}

/// One entry in a definition's ordered precondition list.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Precondition {
    Precursor(Precursor),
    /// Opaque predicate evaluated by the host.
    Host(ConditionKey),
}

// ── ActivableDefinition ───────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActivableDefinition {
    pub id: ActivableId,
    pub enabled: bool,
    /// Segments the player must belong to (any of).  Empty = everyone.
    pub audience: Vec<SegmentId>,
    pub preconditions: Vec<Precondition>,
    pub lifetime: Lifetime,
    pub schedule: Option<RecurringSchedule>,
    pub max_activations: Option<u32>,
    pub max_total_consumes: Option<u32>,
    pub max_consumes_per_activation: Option<u32>,
    pub cooldown: Cooldown,
    /// Whether config-change reconciliation may alter live state at all.
    pub allow_adjustment: bool,
}

impl ActivableDefinition {
    /// An always-available definition: enabled, no audience, no schedule,
    /// `Forever` lifetime, no limits, zero cooldown, adjustable.
    pub fn new(id: impl Into<ActivableId>) -> Self {
        Self {
            id: id.into(),
            enabled: true,
            audience: Vec::new(),
            preconditions: Vec::new(),
            lifetime: Lifetime::Forever,
            schedule: None,
            max_activations: None,
            max_total_consumes: None,
            max_consumes_per_activation: None,
            cooldown: Cooldown::Fixed(Span::ZERO),
            allow_adjustment: true,
        }
    }

    #[inline]
    pub fn activation_limit_reached(&self, num_activated: u32) -> bool {
        self.max_activations.is_some_and(|max| num_activated >= max)
    }

    #[inline]
    pub fn total_consume_limit_reached(&self, total_consumed: u32) -> bool {
        self.max_total_consumes.is_some_and(|max| total_consumed >= max)
    }

    #[inline]
    pub fn activation_consume_limit_reached(&self, consumed_in_activation: u32) -> bool {
        self.max_consumes_per_activation.is_some_and(|max| consumed_in_activation >= max)
    }

    /// Check everything the engine relies on but the type system can't express.
    pub fn validate(&self) -> ActivableResult<()> {
        let invalid = |reason: &str| ActivableError::Invalid {
            id:     self.id.clone(),
            reason: reason.to_owned(),
        };

        if let Some(schedule) = &self.schedule {
            schedule.validate().map_err(|source| ActivableError::Schedule {
                id: self.id.clone(),
                source,
            })?;
        }
        match self.lifetime {
            Lifetime::Fixed(d) if d.is_negative() => return Err(invalid("negative lifetime")),
            Lifetime::ScheduleBound if self.schedule.is_none() => {
                return Err(invalid("schedule-bound lifetime requires a schedule"));
            }
            _ => {}
        }
        match self.cooldown {
            Cooldown::Fixed(d) if d.is_negative() => return Err(invalid("negative cooldown")),
            Cooldown::ScheduleBound if self.schedule.is_none() => {
                return Err(invalid("schedule-bound cooldown requires a schedule"));
            }
            _ => {}
        }
        for (name, limit) in [
            ("max_activations", self.max_activations),
            ("max_total_consumes", self.max_total_consumes),
            ("max_consumes_per_activation", self.max_consumes_per_activation),
        ] {
            if limit == Some(0) {
                return Err(invalid(format!("{name} must be at least 1").as_str()));
            }
        }
        for pre in &self.preconditions {
            match pre {
                Precondition::Precursor(p) if p.activable == self.id => {
                    return Err(invalid("activable cannot be its own precursor"));
                }
                Precondition::Precursor(p) if p.delay.is_negative() => {
                    return Err(invalid("negative precursor delay"));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

// ── DefinitionSet ─────────────────────────────────────────────────────────────

/// All activable definitions of one config version, in declaration order.
///
/// Declaration order is the processing order of every per-tick pass; the
/// hash index is only used for point lookups.
#[derive(Clone, Debug, Default)]
pub struct DefinitionSet {
    defs:  Vec<ActivableDefinition>,
    index: FxHashMap<ActivableId, usize>,
}

impl DefinitionSet {
    /// Validate every definition and build the id index.
    pub fn new(defs: Vec<ActivableDefinition>) -> ActivableResult<Self> {
        let mut index = FxHashMap::default();
        for (i, def) in defs.iter().enumerate() {
            def.validate()?;
            if index.insert(def.id.clone(), i).is_some() {
                return Err(ActivableError::DuplicateId(def.id.clone()));
            }
        }
        Ok(Self { defs, index })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &ActivableId) -> Option<&ActivableDefinition> {
        self.index.get(id).map(|&i| &self.defs[i])
    }

    pub fn contains(&self, id: &ActivableId) -> bool {
        self.index.contains_key(id)
    }

    /// Definitions in declaration order.
    pub fn iter(&self) -> std::slice::Iter<'_, ActivableDefinition> {
        self.defs.iter()
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

impl<'a> IntoIterator for &'a DefinitionSet {
    type Item = &'a ActivableDefinition;
    type IntoIter = std::slice::Iter<'a, ActivableDefinition>;

    fn into_iter(self) -> Self::IntoIter {
        self.defs.iter()
    }
}
