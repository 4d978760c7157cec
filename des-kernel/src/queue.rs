//! The event queue: a total order on scheduled events by
//! `(time, seq)`, with O(log n) insert/extract/remove.
//!
//! Realized as a `BinaryHeap` of `(time, seq)` keys (wrapped in `Reverse`
//! for min-heap ordering) paired with a side table holding the live
//! `EventRecord` payloads, plus a tombstone set. `remove` doesn't walk the
//! heap — it just drops the side-table entry and tombstones the id;
//! `extract_min` lazily skips tombstoned heap entries as it pops them. This
//! is the standard idiomatic answer to "priority queue with cancellation"
//! in Rust, since `BinaryHeap` itself has no efficient arbitrary-removal.

use des_core::{EventId, EventRecord, LogicalTime, Sequence};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

/// A min-priority queue of [`EventRecord`]s ordered by `(time, seq)`.
#[derive(Default)]
pub struct EventQueue {
    heap: BinaryHeap<Reverse<(LogicalTime, Sequence, EventId)>>,
    live: HashMap<EventId, EventRecord>,
    tombstoned: HashSet<EventId>,
}

impl EventQueue {
    /// An empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an event. O(log n).
    pub fn insert(&mut self, event: EventRecord) {
        let key = (event.time, event.seq, event.id);
        self.live.insert(event.id, event);
        self.heap.push(Reverse(key));
    }

    /// Remove and return the lowest `(time, seq)` event, if any. O(log n)
    /// amortized (may pop several tombstoned heap entries first).
    pub fn extract_min(&mut self) -> Option<EventRecord> {
        while let Some(Reverse((_, _, id))) = self.heap.pop() {
            if self.tombstoned.remove(&id) {
                continue;
            }
            if let Some(event) = self.live.remove(&id) {
                return Some(event);
            }
        }
        None
    }

    /// The `(time, seq)` of the next event to be extracted, without
    /// removing it.
    pub fn peek_min(&self) -> Option<(LogicalTime, Sequence)> {
        self.heap
            .iter()
            .filter(|Reverse((_, _, id))| !self.tombstoned.contains(id))
            .map(|Reverse((t, s, _))| (*t, *s))
            .min()
    }

    /// Cancel a still-queued event by id. Returns the removed record, if
    /// it was still live (already-dispatched or unknown ids are a no-op).
    /// O(log n): marks the id tombstoned so a later `extract_min` skips it
    /// without a heap scan.
    pub fn remove(&mut self, id: EventId) -> Option<EventRecord> {
        let event = self.live.remove(&id)?;
        self.tombstoned.insert(id);
        Some(event)
    }

    /// Count of live (non-tombstoned) events in the queue.
    pub fn size(&self) -> usize {
        self.live.len()
    }

    /// True if there are no live events queued.
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Discard every queued event.
    pub fn clear(&mut self) {
        self.heap.clear();
        self.live.clear();
        self.tombstoned.clear();
    }

    /// Drain every still-live event, in no particular order. Used by
    /// shutdown to release every parked continuation.
    pub fn drain_all(&mut self) -> Vec<EventRecord> {
        self.heap.clear();
        self.tombstoned.clear();
        self.live.drain().map(|(_, event)| event).collect()
    }
}
