//! The kernel's error taxonomy.
//!
//! `EventError` is what user code raises from inside `invoke`. `SimError` is
//! everything the kernel itself can report — including `EventError` wrapped
//! with the time/signature context a caller needs to diagnose a failed
//! dispatch.

use crate::time::LogicalTime;
use thiserror::Error;

/// An error raised by user code from inside an [`crate::entity::EntityDispatch::invoke`]
/// body.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum EventError {
    /// The entity body raised an application-level error.
    #[error("{0}")]
    Raised(#[from] Box<dyn std::error::Error + Send + Sync>),

    /// The entity body raised an error with no useful source, just a message.
    #[error("{0}")]
    Message(String),
}

impl EventError {
    /// Construct an `EventError` from a plain message, with no underlying
    /// source error.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}

/// Everything the kernel can report back to a caller of its public surface.
///
/// `SimulationEnded` is deliberately excluded from being wrapped by any other
/// variant — it is never wrapped and always propagates as the clean,
/// successful shutdown signal, not as a failure.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SimError {
    /// Cooperative shutdown in progress or complete. Not a failure: a
    /// parked continuation completed with this variant must be allowed to
    /// propagate through user code untouched.
    #[error("simulation ended")]
    SimulationEnded,

    /// A user error raised from inside an event body, wrapped with enough
    /// kernel context to diagnose it: the event's dispatch time and the
    /// failed method's signature.
    #[error("event dispatch failed at time {time} for signature {signature}: {source}")]
    Event {
        /// Logical time at which the failing event was dispatched.
        time: LogicalTime,
        /// `EntityDispatch::signature` of the failing method.
        signature: String,
        /// The underlying error raised by the entity body.
        #[source]
        source: EventError,
    },

    /// A kernel invariant was violated by the caller — a programming bug,
    /// not a data problem: `post_continuing` with no
    /// ambient kernel, `blocking_sleep` outside an event, a continuation
    /// completed twice, etc.
    #[error("kernel invariant violated: {0}")]
    Invariant(String),

    /// Argument/scheduling validation failed before any state mutation
    ///: negative delay, past-time scheduling, unknown
    /// ordinal, out-of-range arguments.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The event was explicitly cancelled via [`crate::event::EventId`]
    /// removal before it was dispatched; its continuation, if any,
    /// completes with this error.
    #[error("event cancelled")]
    Cancelled,

    /// A platform-level failure (task spawn/join failure, out of memory).
    /// No recovery policy exists at this layer.
    #[error("platform error: {0}")]
    Platform(String),
}

impl SimError {
    /// True if this error represents cooperative shutdown rather than a
    /// failure — callers that match on errors to decide whether to log at
    /// `error!` vs. let it propagate silently should check this first.
    pub fn is_shutdown(&self) -> bool {
        matches!(self, SimError::SimulationEnded)
    }
}
