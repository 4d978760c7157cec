//! Kernel configuration.
//!
//! A typed struct rather than a stringly-typed map, in the style of this
//! codebase's other configuration surfaces — there is no persistent
//! config *file* format at this layer, just a builder a caller constructs
//! in code before `run_loop`.

use des_core::LogicalTime;

/// The four enumerated configuration options a kernel exposes.
#[derive(Debug, Clone)]
pub struct KernelConfig {
    /// Maintain the method-signature histogram. Default: on.
    pub track_spectrum: bool,
    /// Keep non-owning back-links from each event to its poster. Default: off.
    pub track_event_sources: bool,
    /// Capture posting-site info (class/method/line) per event. Default: off.
    pub debug_events: bool,
    /// Optional terminal clock value; `run_loop` stops at or before this time.
    pub end_time: Option<LogicalTime>,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            track_spectrum: true,
            track_event_sources: false,
            debug_events: false,
            end_time: None,
        }
    }
}

impl KernelConfig {
    /// Start from the defaults (`track_spectrum` on, everything else off).
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle spectrum tracking.
    pub fn with_track_spectrum(mut self, on: bool) -> Self {
        self.track_spectrum = on;
        self
    }

    /// Toggle event-source tracking.
    pub fn with_track_event_sources(mut self, on: bool) -> Self {
        self.track_event_sources = on;
        self
    }

    /// Toggle debug-mode posting-site capture.
    pub fn with_debug_events(mut self, on: bool) -> Self {
        self.debug_events = on;
        self
    }

    /// Set a terminal clock value.
    pub fn with_end_time(mut self, end_time: LogicalTime) -> Self {
        self.end_time = Some(end_time);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = KernelConfig::default();
        assert!(cfg.track_spectrum);
        assert!(!cfg.track_event_sources);
        assert!(!cfg.debug_events);
        assert!(cfg.end_time.is_none());
    }

    #[test]
    fn builder_overrides_defaults() {
        let cfg = KernelConfig::new()
            .with_track_spectrum(false)
            .with_debug_events(true)
            .with_end_time(LogicalTime::new(200));
        assert!(!cfg.track_spectrum);
        assert!(cfg.debug_events);
        assert_eq!(cfg.end_time, Some(LogicalTime::new(200)));
    }
}
