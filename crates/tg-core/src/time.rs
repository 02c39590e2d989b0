//! Engine time model.
//!
//! # Design
//!
//! Time is an integer count of milliseconds since the Unix epoch (UTC):
//!
//!   instant  = Timestamp(ms)
//!   duration = Span(ms)
//!
//! Using integers for every instant and duration means all schedule
//! arithmetic is exact and identical on every machine.  The same engine runs
//! on the client (prediction) and the server (authority), so there is no
//! floating point and no wall-clock read anywhere below this crate; the host
//! passes `now` in explicitly.
//!
//! `Span` is signed because UTC offsets west of Greenwich are negative.
//! Schedule leads/trails and lifetimes are validated non-negative by the
//! definition layer.

use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

const MS_PER_SEC: i64 = 1_000;
const MS_PER_MIN: i64 = 60 * MS_PER_SEC;
const MS_PER_HOUR: i64 = 60 * MS_PER_MIN;
const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;

// ── Span ──────────────────────────────────────────────────────────────────────

/// A signed duration in milliseconds.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Span(pub i64);

impl Span {
    pub const ZERO: Span = Span(0);

    #[inline]
    pub const fn from_millis(ms: i64) -> Span {
        Span(ms)
    }

    #[inline]
    pub const fn from_secs(secs: i64) -> Span {
        Span(secs * MS_PER_SEC)
    }

    #[inline]
    pub const fn from_mins(mins: i64) -> Span {
        Span(mins * MS_PER_MIN)
    }

    #[inline]
    pub const fn from_hours(hours: i64) -> Span {
        Span(hours * MS_PER_HOUR)
    }

    #[inline]
    pub const fn from_days(days: i64) -> Span {
        Span(days * MS_PER_DAY)
    }

    #[inline]
    pub const fn as_millis(self) -> i64 {
        self.0
    }

    #[inline]
    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub fn is_positive(self) -> bool {
        self.0 > 0
    }
}

impl Add for Span {
    type Output = Span;
    #[inline]
    fn add(self, rhs: Span) -> Span {
        Span(self.0 + rhs.0)
    }
}

impl Sub for Span {
    type Output = Span;
    #[inline]
    fn sub(self, rhs: Span) -> Span {
        Span(self.0 - rhs.0)
    }
}

impl Neg for Span {
    type Output = Span;
    #[inline]
    fn neg(self) -> Span {
        Span(-self.0)
    }
}

impl Mul<i64> for Span {
    type Output = Span;
    #[inline]
    fn mul(self, rhs: i64) -> Span {
        Span(self.0 * rhs)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let ms = self.0.unsigned_abs();
        let secs = ms / 1_000;
        let (h, m, s) = (secs / 3_600, (secs % 3_600) / 60, secs % 60);
        match ms % 1_000 {
            0 => write!(f, "{sign}{h}h{m:02}m{s:02}s"),
            rem => write!(f, "{sign}{h}h{m:02}m{s:02}.{rem:03}s"),
        }
    }
}

// ── Timestamp ─────────────────────────────────────────────────────────────────

/// An absolute UTC instant, milliseconds since the Unix epoch.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub const EPOCH: Timestamp = Timestamp(0);

    #[inline]
    pub const fn from_unix_millis(ms: i64) -> Timestamp {
        Timestamp(ms)
    }

    #[inline]
    pub const fn from_unix_secs(secs: i64) -> Timestamp {
        Timestamp(secs * MS_PER_SEC)
    }

    #[inline]
    pub const fn unix_millis(self) -> i64 {
        self.0
    }

    /// Span elapsed from `earlier` to `self` (negative if `earlier` is later).
    #[inline]
    pub fn since(self, earlier: Timestamp) -> Span {
        Span(self.0 - earlier.0)
    }
}

impl Add<Span> for Timestamp {
    type Output = Timestamp;
    #[inline]
    fn add(self, rhs: Span) -> Timestamp {
        Timestamp(self.0 + rhs.0)
    }
}

impl AddAssign<Span> for Timestamp {
    #[inline]
    fn add_assign(&mut self, rhs: Span) {
        self.0 += rhs.0;
    }
}

impl Sub<Span> for Timestamp {
    type Output = Timestamp;
    #[inline]
    fn sub(self, rhs: Span) -> Timestamp {
        Timestamp(self.0 - rhs.0)
    }
}

impl Sub for Timestamp {
    type Output = Span;
    #[inline]
    fn sub(self, rhs: Timestamp) -> Span {
        Span(self.0 - rhs.0)
    }
}

impl fmt::Display for Timestamp {
    /// Day number and time of day since the epoch (`d19650 10:30:00`).
    /// Good enough for logs without pulling in a calendar library.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let day = self.0.div_euclid(MS_PER_DAY);
        let in_day = self.0.rem_euclid(MS_PER_DAY);
        let secs = in_day / MS_PER_SEC;
        let (h, m, s) = (secs / 3_600, (secs % 3_600) / 60, secs % 60);
        write!(f, "d{day} {h:02}:{m:02}:{s:02}")
    }
}
