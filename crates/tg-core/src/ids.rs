//! Strongly typed string identifiers.
//!
//! Live-ops configuration names everything with short strings authored by
//! designers (`"WeekendOffer"`, `"Payers"`).  Wrapping each kind in its own
//! newtype keeps an `ActivableId` from being passed where a `SegmentId` is
//! expected.  All IDs are `Ord + Hash` so they work as `BTreeMap` keys (the
//! engine only iterates ordered containers, for determinism).

use std::borrow::Borrow;
use std::fmt;

/// Generate a typed ID wrapper around an owned `String`.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident;) => {
        $(#[$attr])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(transparent))]
        $vis struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                $name(value.into())
            }

            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                $name(s.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                $name(s)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

typed_id! {
    /// Identifies one activable (offer, event, …) across config versions.
    /// This is the stable join key between definitions and runtime state.
    pub struct ActivableId;
}

typed_id! {
    /// A player segment, evaluated by the host.
    pub struct SegmentId;
}

typed_id! {
    /// Key of an opaque host-evaluated precondition.
    pub struct ConditionKey;
}
