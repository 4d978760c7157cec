//! Logical time and the post-order sequence counter.
//!
//! [`LogicalTime`] is the kernel's clock: a 64-bit signed counter that only
//! ever moves forward, advanced exclusively at event extraction. It carries
//! no wall-clock semantics — units are whatever the user's model intends.
//!
//! [`Sequence`] is the tie-break assigned at `post` time. Together
//! `(LogicalTime, Sequence)` is a strict total order over every event ever
//! scheduled in a run.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Logical simulation time.
///
/// Serializes as a plain `i64`, not as a struct — this is the canonical
/// wire format for time in traces and snapshots.
///
/// # Examples
///
/// ```
/// use des_core::time::LogicalTime;
///
/// let t = LogicalTime::new(10);
/// let t2 = t.checked_add(5).unwrap();
/// assert_eq!(t2.value(), 15);
/// assert!(LogicalTime::new(-1).value() < 0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogicalTime(i64);

impl LogicalTime {
    /// The time origin. Most simulations start here.
    pub const ZERO: Self = Self(0);

    /// Construct a logical time from a raw value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// The raw integer value.
    pub fn value(&self) -> i64 {
        self.0
    }

    /// Whether this time is valid as a scheduling target (non-negative).
    pub fn is_valid_schedule_target(&self) -> bool {
        self.0 >= 0
    }

    /// Add a non-negative delay, returning `None` on overflow.
    ///
    /// Overflow is treated the same as any other scheduling validation
    /// failure by callers (see [`crate::error::SimError::Validation`]):
    /// fail closed rather than silently wrapping.
    pub fn checked_add(&self, delay: i64) -> Option<Self> {
        self.0.checked_add(delay).map(Self)
    }
}

impl std::fmt::Display for LogicalTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for LogicalTime {
    fn default() -> Self {
        Self::ZERO
    }
}

/// Monotonic post-order tie-break, unique within a run and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sequence(u64);

impl Sequence {
    /// Construct a sequence from a raw value.
    ///
    /// Ordinary code obtains sequences from [`SequenceGenerator::next`];
    /// this is for reconstructing a sequence from a persisted/logged value
    /// (e.g. a trace replay) where the generator itself is unavailable.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// The raw integer value.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Sequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Generates strictly increasing [`Sequence`] values for one kernel run.
///
/// Shared via `Arc` between the kernel and anything that needs to assign a
/// sequence number at post time without holding the queue lock.
#[derive(Debug, Default)]
pub struct SequenceGenerator(AtomicU64);

impl SequenceGenerator {
    /// Create a generator starting at zero.
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    /// Assign and return the next sequence number.
    pub fn next(&self) -> Sequence {
        Sequence(self.0.fetch_add(1, Ordering::Relaxed))
    }
}
