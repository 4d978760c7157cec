//! The scheduler: the single authoritative event processor.
//!
//! # The admission gate and suspension
//!
//! The scheduler needs a hard invariant: at most one event body executes
//! at a time, realized here with a `tokio::sync::Semaphore` holding
//! exactly one permit. Each event still runs in its own `tokio::task`, so
//! that a park from deep within the call stack captures the continuation
//! correctly — in idiomatic async Rust this falls out for free: `invoke`
//! is an `async fn`, and awaiting a [`des_core::Waiter`] inside it
//! suspends exactly that task's state machine, at any call depth, with no
//! manual stack capture required. The permit travels with the task:
//! acquired at the top of each loop iteration — before the queue is even
//! peeked, so the loop blocks until the previously dispatched event has
//! parked or completed and thus posted any events it was going to post —
//! handed off to the spawned task, released the instant that task parks
//! (so the loop can move on to other events), and re-acquired before the
//! task resumes running body code.
//!
//! # Collapsing `sleep` and `blocking_sleep`
//!
//! A bytecode-rewritten coroutine runtime can distinguish "`sleep`
//! re-posts and returns to the loop without blocking" from
//! "`blocking_sleep` parks on a fresh continuation", because a cheap
//! "fall off and get re-entered" path avoids full continuation overhead
//! there. Rust's `async fn` has no such cheap path: suspending
//! mid-function *always* goes through the same await/wake machinery, so
//! both operations are implemented by the same [`Kernel::park_for`]
//! helper, applying the continuation-based option uniformly.
//!
//! # Resuming a parked caller
//!
//! `post_continuing`'s suspend/resume dance collapses similarly:
//! swapping the calling event out and parking it on the callee's
//! continuation is just "the calling `async fn` awaits a continuation" —
//! there is no separate swapped-out state to manage, because the Rust
//! future itself *is* the saved stack. Re-posting the resumed caller at
//! the current time while preserving FIFO order — needed so a resumed
//! caller doesn't jump ahead of other events already queued for the same
//! instant — is approximated here by having the resuming task re-acquire
//! the admission gate (a FIFO-fair `tokio::sync::Semaphore`) rather than
//! literally re-inserting into the event queue; see `DESIGN.md` for the
//! full tradeoff writeup.

use des_core::{
    CallerLink, Continuation, DebugSite, EntityDispatch, EventError, EventId, EventRecord,
    LogicalTime, SequenceGenerator, SimError, Value,
};
use std::collections::HashMap;
use std::panic::Location;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedSemaphorePermit, Semaphore};

use crate::ambient;
use crate::config::KernelConfig;
use crate::queue::EventQueue;
use crate::stats::{Stats, StatsSnapshot};

/// Outcome of a completed [`Kernel::run_loop`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Logical time the loop began draining at.
    pub sim_start: LogicalTime,
    /// Logical time the loop stopped at.
    pub sim_end: LogicalTime,
    /// Total events dispatched during the run.
    pub total_events: u64,
}

/// The kernel-internal entity that backs every `sleep`/`blocking_sleep`
/// wake and every channel rendezvous delivery: its `invoke` does nothing
/// but hand back whatever single argument it was given (or `Null`), so
/// the general "complete the attached continuation with the return value"
/// dispatch rule delivers the right payload without a
/// special case in the loop.
struct DeliverEntity;

#[async_trait::async_trait]
impl EntityDispatch for DeliverEntity {
    async fn invoke(&self, _ordinal: u32, args: &[Value]) -> Result<Value, EventError> {
        Ok(args.first().cloned().unwrap_or(Value::Null))
    }

    fn signature(&self, _ordinal: u32) -> String {
        "<kernel:deliver>".to_string()
    }
}

struct RunningEvent {
    permit: StdMutex<Option<OwnedSemaphorePermit>>,
}

impl RunningEvent {
    fn new(permit: OwnedSemaphorePermit) -> Self {
        Self {
            permit: StdMutex::new(Some(permit)),
        }
    }

    fn take(&self) -> Option<OwnedSemaphorePermit> {
        self.permit
            .lock()
            .expect("running-event permit lock poisoned")
            .take()
    }

    fn put(&self, permit: OwnedSemaphorePermit) {
        *self.permit.lock().expect("running-event permit lock poisoned") = Some(permit);
    }
}

tokio::task_local! {
    static RUNNING: RunningEvent;
}

#[derive(Debug, Clone, Copy)]
enum Shutdown {
    Running,
    Requested(LogicalTime),
}

/// A trace-source entry: the signature and caller link recorded at post
/// time, evicted once the event dispatches.
struct SourceEntry {
    signature: String,
    caller: CallerLink,
}

/// The single authoritative event processor.
///
/// Owns the queue, current time, current-event slot, statistics, and the
/// admission gate. All public operations are `async fn`s.
pub struct Kernel {
    queue: AsyncMutex<EventQueue>,
    current_time: AsyncMutex<LogicalTime>,
    current_event: AsyncMutex<Option<EventId>>,
    seq: SequenceGenerator,
    stats: StdMutex<Stats>,
    config: KernelConfig,
    gate: Arc<Semaphore>,
    shutdown: AsyncMutex<Shutdown>,
    sources: StdMutex<HashMap<EventId, SourceEntry>>,
    fatal: StdMutex<Option<SimError>>,
}

impl Kernel {
    /// Construct a fresh kernel, clock at [`LogicalTime::ZERO`], ready to
    /// have events posted and [`Kernel::run_loop`] driven.
    pub fn new(config: KernelConfig) -> Arc<Self> {
        let shutdown_start = Shutdown::Running;
        Arc::new(Self {
            queue: AsyncMutex::new(EventQueue::new()),
            current_time: AsyncMutex::new(LogicalTime::ZERO),
            current_event: AsyncMutex::new(None),
            seq: SequenceGenerator::new(),
            stats: StdMutex::new(Stats::new()),
            config,
            gate: Arc::new(Semaphore::new(1)),
            shutdown: AsyncMutex::new(shutdown_start),
            sources: StdMutex::new(HashMap::new()),
            fatal: StdMutex::new(None),
        })
    }

    /// The kernel's own clock.
    pub async fn current_time(&self) -> LogicalTime {
        *self.current_time.lock().await
    }

    /// A clone-on-read snapshot of dispatch counters and the spectrum map.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.lock().expect("stats lock poisoned").snapshot()
    }

    /// Total events dispatched so far.
    pub fn total_events(&self) -> u64 {
        self.stats.lock().expect("stats lock poisoned").total_events()
    }

    /// The method-signature histogram, empty unless `track_spectrum` is on.
    pub fn spectrum(&self) -> HashMap<String, u64> {
        self.stats().spectrum
    }

    /// Best-effort human-readable trace: walks `caller` back-links from
    /// `id`, emitting `"…"` the first time a link resolves to
    /// [`CallerLink::Absent`] (because tracking is off or the caller was
    /// already evicted).
    pub fn print_trace(&self, id: EventId) -> String {
        let sources = self.sources.lock().expect("sources lock poisoned");
        let mut frames = Vec::new();
        let mut current = Some(id);
        while let Some(cur) = current {
            match sources.get(&cur) {
                Some(entry) => {
                    frames.push(entry.signature.clone());
                    current = entry.caller.id();
                }
                None => {
                    frames.push("…".to_string());
                    break;
                }
            }
        }
        frames.join(" <- ")
    }

    /// Fire-and-forget: schedule `target.invoke(ordinal, args)` at the
    /// current time.
    #[track_caller]
    pub async fn post_event(
        self: &Arc<Self>,
        target: Arc<dyn EntityDispatch>,
        ordinal: u32,
        args: Vec<Value>,
    ) -> Result<EventId, SimError> {
        let now = self.current_time().await;
        self.post_event_at(now, target, ordinal, args).await
    }

    /// Schedule `target.invoke(ordinal, args)` at `time >= current_time`
    ///.
    #[track_caller]
    pub async fn post_event_at(
        self: &Arc<Self>,
        time: LogicalTime,
        target: Arc<dyn EntityDispatch>,
        ordinal: u32,
        args: Vec<Value>,
    ) -> Result<EventId, SimError> {
        let caller_site = Location::caller();
        self.validate_schedule_target(time).await?;
        let signature = target.signature(ordinal);
        let (id, seq) = self.next_id().await;
        let caller = self.caller_link_for_current().await;
        self.remember_source(id, &signature, caller);
        let debug = self.capture_debug_site(caller_site);
        let record = EventRecord {
            id,
            time,
            seq,
            target,
            ordinal,
            args,
            caller,
            continuation: None,
            debug,
        };
        self.queue.lock().await.insert(record);
        tracing::debug!(
            time = time.value(),
            seq = seq.value(),
            signature = %signature,
            "des.event.posted"
        );
        Ok(id)
    }

    /// Blocking/value-returning dispatch. Must be called from within an
    /// executing event body; awaits the callee's return value or
    /// propagates its error.
    pub async fn post_continuing(
        self: &Arc<Self>,
        target: Arc<dyn EntityDispatch>,
        ordinal: u32,
        args: Vec<Value>,
    ) -> Result<Value, SimError> {
        self.require_running_event("post_continuing")?;
        let now = self.current_time().await;
        self.check_not_shutdown(now).await?;
        let signature = target.signature(ordinal);
        let (id, seq) = self.next_id().await;
        let caller = self.caller_link_for_current().await;
        self.remember_source(id, &signature, caller);
        let (continuation, waiter) = Continuation::pair();
        let continuation = Arc::new(continuation);
        continuation.mark_parked();
        let record = EventRecord {
            id,
            time: now,
            seq,
            target,
            ordinal,
            args,
            caller,
            continuation: Some(continuation),
            debug: None,
        };
        self.queue.lock().await.insert(record);
        tracing::debug!(
            time = now.value(),
            seq = seq.value(),
            signature = %signature,
            "des.event.posted_continuing"
        );
        self.release_gate();
        let result = waiter.park().await;
        self.reacquire_gate().await;
        result
    }

    /// Suspend the current event until `dt` logical units from now, then
    /// resume (see module doc comment for why `sleep` and
    /// `blocking_sleep` are unified). `dt` must be non-negative.
    pub async fn sleep(self: &Arc<Self>, dt: i64) -> Result<(), SimError> {
        self.park_for(dt).await
    }

    /// Alias of [`Kernel::sleep`] kept for call-site fidelity with a
    /// `blocking_sleep` name; identical behavior (see module doc comment).
    pub async fn blocking_sleep(self: &Arc<Self>, dt: i64) -> Result<(), SimError> {
        self.park_for(dt).await
    }

    async fn park_for(self: &Arc<Self>, dt: i64) -> Result<(), SimError> {
        self.require_running_event("sleep")?;
        if dt < 0 {
            return Err(SimError::Validation(
                "sleep delay must be non-negative".to_string(),
            ));
        }
        let now = self.current_time().await;
        let target_time = now
            .checked_add(dt)
            .ok_or_else(|| SimError::Validation("sleep target time overflowed".to_string()))?;
        let (continuation, waiter) = Continuation::pair();
        let continuation = Arc::new(continuation);
        self.schedule_delivery(target_time, continuation, Value::Null)
            .await?;
        self.release_gate();
        let result = waiter.park().await;
        self.reacquire_gate().await;
        result.map(|_| ())
    }

    /// Schedule a delivery of `value` to `continuation` at `time` (used by
    /// `des-channel` to implement rendezvous resumption at the current
    /// kernel time, via the same `DeliverEntity` mechanism `sleep` uses).
    pub async fn schedule_delivery(
        self: &Arc<Self>,
        time: LogicalTime,
        continuation: Arc<Continuation<Value>>,
        value: Value,
    ) -> Result<EventId, SimError> {
        self.validate_schedule_target(time).await?;
        continuation.mark_parked();
        let (id, seq) = self.next_id().await;
        let record = EventRecord {
            id,
            time,
            seq,
            target: Arc::new(DeliverEntity),
            ordinal: 0,
            args: vec![value],
            caller: CallerLink::Absent,
            continuation: Some(continuation),
            debug: None,
        };
        self.queue.lock().await.insert(record);
        Ok(id)
    }

    /// Park the calling event on an already-created waiter, releasing and
    /// later re-acquiring the admission gate exactly like `sleep`/
    /// `post_continuing` (used by `des-channel`'s `put`/`take`). Generic
    /// over the waited-on type, since a channel's payload type need not be
    /// the `Value` the entity-dispatch boundary uses — channel rendezvous
    /// never crosses that boundary at all.
    pub async fn park_on<T>(&self, waiter: des_core::Waiter<T>) -> Result<T, SimError> {
        self.require_running_event("channel operation")?;
        self.release_gate();
        let result = waiter.park().await;
        self.reacquire_gate().await;
        result
    }

    /// Move the clock forward without draining the queue. Must be called
    /// *outside* of an executing event.
    pub async fn advance(&self, dt: i64) -> Result<(), SimError> {
        if has_running_event() {
            return Err(SimError::Invariant(
                "advance must not be called from within an event".to_string(),
            ));
        }
        if dt < 0 {
            return Err(SimError::Validation(
                "advance delta must be non-negative".to_string(),
            ));
        }
        let mut current = self.current_time.lock().await;
        *current = current
            .checked_add(dt)
            .ok_or_else(|| SimError::Validation("advance overflowed logical time".to_string()))?;
        Ok(())
    }

    /// Cancel a still-queued event by id. If it carried a continuation,
    /// that continuation is completed with [`SimError::Cancelled`].
    pub async fn cancel(&self, id: EventId) -> bool {
        let removed = self.queue.lock().await.remove(id);
        self.sources.lock().expect("sources lock poisoned").remove(&id);
        match removed {
            Some(event) => {
                if let Some(continuation) = event.continuation {
                    let _ = continuation.complete_error(SimError::Cancelled);
                }
                true
            }
            None => false,
        }
    }

    /// Request cooperative shutdown as soon as possible.
    pub async fn end_simulation(&self) {
        let now = self.current_time().await;
        *self.shutdown.lock().await = Shutdown::Requested(now);
        tracing::info!(time = now.value(), "des.kernel.end_simulation");
    }

    /// Request cooperative shutdown no later than `time`.
    pub async fn end_at(&self, time: LogicalTime) {
        *self.shutdown.lock().await = Shutdown::Requested(time);
        tracing::info!(time = time.value(), "des.kernel.end_at");
    }

    /// Drain the queue, dispatching events in `(time, seq)` order, until
    /// the queue is empty, shutdown is requested, or `end_time` (if given)
    /// is reached. Propagates the first fatal (uncaught, non-continuing)
    /// event error; returns cleanly on cooperative shutdown.
    pub async fn run_loop(self: &Arc<Self>, end_time: Option<LogicalTime>) -> Result<RunSummary, SimError> {
        if let Some(t) = end_time {
            self.end_at(t).await;
        } else if let Some(t) = self.config.end_time {
            self.end_at(t).await;
        }
        let sim_start = self.current_time().await;
        tracing::info!(start = sim_start.value(), "des.kernel.run_loop.start");

        loop {
            // Acquired before the queue is even peeked: the previously
            // dispatched event holds this same permit until it parks or
            // completes, so waiting for it here guarantees any follow-on
            // events it posts (or continuations it parks on) are visible
            // before this iteration judges the queue empty.
            let permit = self
                .gate
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| SimError::Platform("admission gate semaphore closed".to_string()))?;

            let stop_at = match *self.shutdown.lock().await {
                Shutdown::Requested(t) => Some(t),
                Shutdown::Running => None,
            };
            let peek = self.queue.lock().await.peek_min();
            let stopped_at_boundary = match (peek, stop_at) {
                (Some((t, _)), Some(end)) => t > end,
                _ => false,
            };
            let should_stop = peek.is_none() || stopped_at_boundary;
            if should_stop {
                drop(permit);
                if stopped_at_boundary {
                    if let Some(end) = stop_at {
                        let mut current = self.current_time.lock().await;
                        if *current < end {
                            *current = end;
                        }
                    }
                }
                self.release_all_parked().await;
                break;
            }

            let event = {
                let mut queue = self.queue.lock().await;
                queue.extract_min()
            };
            let Some(event) = event else {
                drop(permit);
                self.release_all_parked().await;
                break;
            };

            *self.current_time.lock().await = event.time;
            *self.current_event.lock().await = Some(event.id);
            let signature = event.target.signature(event.ordinal);
            self.stats
                .lock()
                .expect("stats lock poisoned")
                .record_dispatch(&signature, self.config.track_spectrum);
            tracing::debug!(
                time = event.time.value(),
                seq = event.seq.value(),
                signature = %signature,
                "des.event.dispatching"
            );

            let kernel = Arc::clone(self);
            tokio::spawn(kernel.dispatch_event(event, signature, permit));
        }

        let sim_end = self.current_time().await;
        let total_events = self.total_events();
        tracing::info!(
            end = sim_end.value(),
            total_events,
            "des.kernel.run_loop.end"
        );

        if let Some(fatal) = self.fatal.lock().expect("fatal lock poisoned").take() {
            return Err(fatal);
        }
        Ok(RunSummary {
            sim_start,
            sim_end,
            total_events,
        })
    }

    async fn dispatch_event(
        self: Arc<Self>,
        event: EventRecord,
        signature: String,
        permit: OwnedSemaphorePermit,
    ) {
        let EventRecord {
            id,
            time,
            target,
            ordinal,
            args,
            continuation,
            ..
        } = event;

        let running = RunningEvent::new(permit);
        let kernel = Arc::clone(&self);
        let invoke_future = async move { target.invoke(ordinal, &args).await };
        let result = ambient::scope(kernel, RUNNING.scope(running, invoke_future)).await;

        {
            let mut current = self.current_event.lock().await;
            if *current == Some(id) {
                *current = None;
            }
        }
        self.sources.lock().expect("sources lock poisoned").remove(&id);

        match result {
            Ok(value) => {
                if let Some(continuation) = continuation {
                    let _ = continuation.complete(value);
                }
            }
            Err(err) => {
                tracing::warn!(
                    time = time.value(),
                    signature = %signature,
                    error = %err,
                    "des.event.raised"
                );
                let wrapped = SimError::Event {
                    time,
                    signature,
                    source: err,
                };
                if let Some(continuation) = continuation {
                    let _ = continuation.complete_error(wrapped);
                } else {
                    tracing::error!(time = time.value(), error = %wrapped, "des.event.fatal");
                    *self.fatal.lock().expect("fatal lock poisoned") = Some(wrapped);
                    self.end_at(time).await;
                }
            }
        }
    }

    async fn release_all_parked(&self) {
        let drained = self.queue.lock().await.drain_all();
        self.sources.lock().expect("sources lock poisoned").clear();
        for event in drained {
            if let Some(continuation) = event.continuation {
                let _ = continuation.complete_error(SimError::SimulationEnded);
            }
        }
    }

    async fn next_id(&self) -> (EventId, des_core::Sequence) {
        let seq = self.seq.next();
        (EventId::from(seq), seq)
    }

    async fn caller_link_for_current(&self) -> CallerLink {
        if !self.config.track_event_sources {
            return CallerLink::Absent;
        }
        match *self.current_event.lock().await {
            Some(id) => CallerLink::Present(id),
            None => CallerLink::Absent,
        }
    }

    fn remember_source(&self, id: EventId, signature: &str, caller: CallerLink) {
        if !self.config.track_event_sources {
            return;
        }
        self.sources.lock().expect("sources lock poisoned").insert(
            id,
            SourceEntry {
                signature: signature.to_string(),
                caller,
            },
        );
    }

    fn capture_debug_site(&self, location: &'static Location<'static>) -> Option<DebugSite> {
        if !self.config.debug_events {
            return None;
        }
        Some(DebugSite {
            site_class: location.file().to_string(),
            site_method: "post_event".to_string(),
            site_line: location.line(),
        })
    }

    async fn validate_schedule_target(&self, time: LogicalTime) -> Result<(), SimError> {
        if !time.is_valid_schedule_target() {
            return Err(SimError::Validation(format!(
                "cannot schedule at negative time {time}"
            )));
        }
        let now = self.current_time().await;
        if time < now {
            return Err(SimError::Validation(format!(
                "cannot schedule at {time}, already past current time {now}"
            )));
        }
        self.check_not_shutdown(now).await?;
        Ok(())
    }

    async fn check_not_shutdown(&self, now: LogicalTime) -> Result<(), SimError> {
        match *self.shutdown.lock().await {
            Shutdown::Requested(end) if now > end => Err(SimError::SimulationEnded),
            _ => Ok(()),
        }
    }

    fn require_running_event(&self, what: &str) -> Result<(), SimError> {
        if has_running_event() {
            Ok(())
        } else {
            Err(SimError::Invariant(format!(
                "{what} called with no event currently executing on this task"
            )))
        }
    }

    fn release_gate(&self) {
        let permit = RUNNING.with(|running| running.take());
        drop(permit);
    }

    async fn reacquire_gate(&self) {
        let permit = self
            .gate
            .clone()
            .acquire_owned()
            .await
            .expect("admission gate semaphore never closes");
        RUNNING.with(|running| running.put(permit));
    }
}

fn has_running_event() -> bool {
    RUNNING.try_with(|_| ()).is_ok()
}
