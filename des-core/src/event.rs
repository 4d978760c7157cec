//! The event record: the unit of scheduling.

use crate::continuation::Continuation;
use crate::entity::EntityDispatch;
use crate::ids::EventId;
use crate::source::CallerLink;
use crate::time::{LogicalTime, Sequence};
use crate::value::Value;
use std::sync::Arc;

/// Posting-site information captured when `debug_events` is enabled.
/// Captured via `#[track_caller]` at the transformed dispatch wrapper's
/// call site — one frame up from the user's own call, and far cheaper
/// than a full stack walk.
#[derive(Debug, Clone)]
pub struct DebugSite {
    /// Best-effort class/module name of the posting site.
    pub site_class: String,
    /// Best-effort method name of the posting site.
    pub site_method: String,
    /// Source line of the posting site.
    pub site_line: u32,
}

/// A scheduled invocation of one method on one entity at one logical time.
///
/// Ordering (`Ord`/`PartialOrd`) is defined purely by `(time, seq)` — the
/// total order the event queue maintains — even though the record carries
/// fields (the entity handle, boxed args) that have no natural order of
/// their own.
pub struct EventRecord {
    /// Stable identity, used for cancellation and caller-link lookups.
    pub id: EventId,
    /// Logical time this event is scheduled to run at.
    pub time: LogicalTime,
    /// Tie-break assigned at post time.
    pub seq: Sequence,
    /// The entity this event will be dispatched to.
    pub target: Arc<dyn EntityDispatch>,
    /// Method ordinal within the target's dispatch table.
    pub ordinal: u32,
    /// Owned argument values, released after `invoke` returns.
    pub args: Vec<Value>,
    /// Weak back-link to the posting event, if source tracking is enabled.
    pub caller: CallerLink,
    /// Present iff this event is "continuing" (blocking or value-returning):
    /// completed with the callee's result once `invoke` returns or raises.
    pub continuation: Option<Arc<Continuation<Value>>>,
    /// Posting-site info, present only when `debug_events` is enabled.
    pub debug: Option<DebugSite>,
}

impl EventRecord {
    /// The `(time, seq)` ordering key used by the event queue.
    pub fn order_key(&self) -> (LogicalTime, Sequence) {
        (self.time, self.seq)
    }
}

impl std::fmt::Debug for EventRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventRecord")
            .field("id", &self.id)
            .field("time", &self.time)
            .field("seq", &self.seq)
            .field("ordinal", &self.ordinal)
            .field("signature", &self.target.signature(self.ordinal))
            .field("caller", &self.caller)
            .field("continuing", &self.continuation.is_some())
            .finish()
    }
}

impl PartialEq for EventRecord {
    fn eq(&self, other: &Self) -> bool {
        self.order_key() == other.order_key()
    }
}

impl Eq for EventRecord {}

impl PartialOrd for EventRecord {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EventRecord {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.order_key().cmp(&other.order_key())
    }
}
