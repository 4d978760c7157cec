//! Event identity.

use crate::time::Sequence;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of one scheduled event, for the lifetime of a run.
///
/// An event's [`Sequence`] is already unique and never reused within a run,
/// so `EventId` is simply that sequence number made into a distinct type —
/// this keeps "the tie-break used for ordering" and "the key used to look
/// an event up" conceptually separate even though they share a value,
/// the same way typed ID wrappers elsewhere in this codebase prevent
/// mixing up identifiers that happen to share a representation.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(u64);

impl From<Sequence> for EventId {
    fn from(seq: Sequence) -> Self {
        Self(seq.value())
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "evt#{}", self.0)
    }
}
