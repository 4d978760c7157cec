//! Kernel statistics.
//!
//! `total_events` is a plain counter; the spectrum is a signature → count
//! histogram. The kernel already holds everything behind one `Mutex` per
//! its kernel-private shared-state policy, so `Stats` just groups the two
//! fields under that same lock rather than introducing a second atomic;
//! `snapshot` gives callers a clone-on-read copy instead of a live view.

use std::collections::HashMap;

/// Dispatch counters and the method-signature histogram.
#[derive(Debug, Clone, Default)]
pub struct Stats {
    total_events: u64,
    spectrum: HashMap<String, u64>,
}

/// A point-in-time, read-only copy of [`Stats`].
#[derive(Debug, Clone, Default)]
pub struct StatsSnapshot {
    /// Total number of events dispatched so far.
    pub total_events: u64,
    /// Signature → dispatch-count histogram, empty if spectrum tracking
    /// is disabled.
    pub spectrum: HashMap<String, u64>,
}

impl Stats {
    /// A fresh, zeroed stats block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one dispatch of `signature`, incrementing `total_events`
    /// unconditionally and the spectrum entry only if `track_spectrum`.
    pub fn record_dispatch(&mut self, signature: &str, track_spectrum: bool) {
        self.total_events += 1;
        if track_spectrum {
            *self.spectrum.entry(signature.to_string()).or_insert(0) += 1;
        }
    }

    /// Total dispatches recorded so far.
    pub fn total_events(&self) -> u64 {
        self.total_events
    }

    /// A clone-on-read snapshot, safe to hand to a reader outside the loop.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total_events: self.total_events,
            spectrum: self.spectrum.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_total_regardless_of_spectrum_tracking() {
        let mut stats = Stats::new();
        stats.record_dispatch("A.op()", false);
        stats.record_dispatch("A.op()", false);
        assert_eq!(stats.total_events(), 2);
        assert!(stats.snapshot().spectrum.is_empty());
    }

    #[test]
    fn spectrum_counts_per_signature() {
        let mut stats = Stats::new();
        stats.record_dispatch("A.op()", true);
        stats.record_dispatch("A.op()", true);
        stats.record_dispatch("B.op()", true);
        let snap = stats.snapshot();
        assert_eq!(snap.spectrum.get("A.op()"), Some(&2));
        assert_eq!(snap.spectrum.get("B.op()"), Some(&1));
        assert_eq!(snap.total_events, 3);
    }
}
