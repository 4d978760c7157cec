//! Bounded, zero-capacity synchronous rendezvous.
//!
//! No value is ever stored inside the channel between a `put` and a
//! `take` — the transfer happens atomically on match, under the
//! channel's own `tokio::sync::Mutex`. A parked party is kept in a FIFO
//! wait list per direction (`VecDeque`); on match the longest-waiting
//! counterpart is popped from the front.

use des_core::{Continuation, SimError};
use des_kernel::Kernel;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;

struct ProducerEntry<T> {
    value: T,
    /// Completed once a consumer claims `value`, waking the parked `put`.
    continuation: Arc<Continuation<()>>,
}

#[derive(Default)]
struct State<T> {
    consumers: VecDeque<Arc<Continuation<T>>>,
    producers: VecDeque<ProducerEntry<T>>,
}

/// A bounded, zero-capacity synchronous rendezvous channel.
///
/// `put` blocks the caller until a matching `take` is ready to receive,
/// and vice versa; whichever side arrives second completes the transfer
/// without parking at all. Both sides re-enter the kernel's admission
/// gate through [`Kernel::park_on`] exactly like `sleep`/`post_continuing`,
/// so a rendezvous is a suspension point like any other.
pub struct Channel<T> {
    kernel: Arc<Kernel>,
    state: AsyncMutex<State<T>>,
}

impl<T: Send + 'static> Channel<T> {
    /// Create a new, empty channel bound to `kernel`.
    pub fn new(kernel: Arc<Kernel>) -> Self {
        Self {
            kernel,
            state: AsyncMutex::new(State {
                consumers: VecDeque::new(),
                producers: VecDeque::new(),
            }),
        }
    }

    /// Hand `value` to a consumer. If one is already waiting, the
    /// transfer is immediate and this call never parks. Otherwise this
    /// call parks until a `take` claims the value.
    pub async fn put(&self, value: T) -> Result<(), SimError> {
        let waiter = {
            let mut state = self.state.lock().await;
            if let Some(consumer) = state.consumers.pop_front() {
                drop(state);
                tracing::debug!("des.channel.put.matched_waiting_consumer");
                // A dropped consumer waiter (task gone) just means nobody
                // claims the value; the producer still successfully handed
                // it off from the channel's point of view.
                let _ = consumer.complete(value);
                return Ok(());
            }
            let (continuation, waiter) = Continuation::pair();
            continuation.mark_parked();
            state.producers.push_back(ProducerEntry {
                value,
                continuation: Arc::new(continuation),
            });
            waiter
        };
        tracing::debug!("des.channel.put.parking");
        self.kernel.park_on(waiter).await
    }

    /// Receive a value from a producer. If one is already waiting, the
    /// transfer is immediate and this call never parks. Otherwise this
    /// call parks until a `put` arrives.
    pub async fn take(&self) -> Result<T, SimError> {
        let outcome = {
            let mut state = self.state.lock().await;
            if let Some(producer) = state.producers.pop_front() {
                drop(state);
                tracing::debug!("des.channel.take.matched_waiting_producer");
                let _ = producer.continuation.complete(());
                return Ok(producer.value);
            }
            let (continuation, waiter) = Continuation::pair();
            continuation.mark_parked();
            state.consumers.push_back(Arc::new(continuation));
            waiter
        };
        tracing::debug!("des.channel.take.parking");
        self.kernel.park_on(outcome).await
    }
}
