//! The continuation primitive: a one-shot rendezvous that
//! suspends an event task until another event explicitly completes it.
//!
//! Built on [`tokio::sync::oneshot`], which is already single-producer /
//! single-consumer and one-shot by construction. A *second*
//! `complete`/`complete_error` call needs to be reported as a kernel
//! invariant violation rather than fail silently — `oneshot`'s own `send`
//! merely returns `Err` when the receiver was dropped, which is a different
//! condition — so [`Continuation`] wraps the sender behind a guarded
//! `Option` that only the first completion call can take.

use crate::error::SimError;
use std::sync::Mutex;
use tokio::sync::oneshot;

/// Lifecycle of a continuation: `Fresh` until parked, `Parked` while a
/// caller is suspended awaiting it, `Completed` once a value or error has
/// been delivered. Tracked only for diagnostics — `park`/`complete` enforce
/// the legal transitions directly via ownership and the guarded sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContinuationState {
    /// Created, not yet awaited.
    Fresh,
    /// A task is suspended in [`Waiter::park`].
    Parked,
    /// The value or error has been delivered; the waiter has or will resume.
    Completed,
}

/// The producer side of a continuation: the handle another event holds to
/// wake the parked caller.
pub struct Continuation<T> {
    sender: Mutex<Option<oneshot::Sender<Result<T, SimError>>>>,
    state: Mutex<ContinuationState>,
}

/// The consumer side of a continuation: held by the parked caller, consumed
/// by [`Waiter::park`].
pub struct Waiter<T> {
    receiver: oneshot::Receiver<Result<T, SimError>>,
}

impl<T> Continuation<T> {
    /// Create a fresh continuation pair: a producer handle for the event
    /// that will complete it, and a waiter for the event that parks on it.
    pub fn pair() -> (Self, Waiter<T>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                sender: Mutex::new(Some(tx)),
                state: Mutex::new(ContinuationState::Fresh),
            },
            Waiter { receiver: rx },
        )
    }

    /// Current lifecycle state, for diagnostics and tests.
    pub fn state(&self) -> ContinuationState {
        *self.state.lock().expect("continuation state lock poisoned")
    }

    /// Mark the continuation as parked — called by the kernel once it has
    /// handed the matching [`Waiter`] to a suspended task.
    pub fn mark_parked(&self) {
        let mut state = self.state.lock().expect("continuation state lock poisoned");
        if *state == ContinuationState::Fresh {
            *state = ContinuationState::Parked;
        }
    }

    /// Complete the continuation with a value, waking the parked task.
    ///
    /// Returns [`SimError::Invariant`] if the continuation was already
    /// completed — exactly one of `complete`/`complete_error` may
    /// succeed in a continuation's lifetime.
    pub fn complete(&self, value: T) -> Result<(), SimError> {
        self.finish(Ok(value))
    }

    /// Complete the continuation with an error, which re-raises in the
    /// parked caller's own frame.
    pub fn complete_error(&self, error: SimError) -> Result<(), SimError> {
        self.finish(Err(error))
    }

    fn finish(&self, outcome: Result<T, SimError>) -> Result<(), SimError> {
        let mut sender = self.sender.lock().expect("continuation sender lock poisoned");
        match sender.take() {
            Some(tx) => {
                *self.state.lock().expect("continuation state lock poisoned") =
                    ContinuationState::Completed;
                // A dropped receiver (the waiter was abandoned) is not this
                // call's problem to report; the caller already got what it
                // asked for: the continuation is completed.
                let _ = tx.send(outcome);
                Ok(())
            }
            None => Err(SimError::Invariant(
                "continuation already completed".to_string(),
            )),
        }
    }
}

impl<T> Waiter<T> {
    /// Suspend until the continuation is completed, then return the value
    /// or propagate the stored error in this task's own frame.
    pub async fn park(self) -> Result<T, SimError> {
        match self.receiver.await {
            Ok(outcome) => outcome,
            Err(_) => Err(SimError::Platform(
                "continuation dropped without completion".to_string(),
            )),
        }
    }
}
