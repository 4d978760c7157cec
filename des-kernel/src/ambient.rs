//! Ambient kernel binding.
//!
//! A thread-local singleton doesn't fit an async runtime where many event
//! tasks interleave on a shared thread pool; what's needed instead is an
//! explicit task-local slot established when a task is created and
//! inherited by the event tasks it spawns. Rust's `tokio::task_local!` is
//! exactly that slot: unlike a thread-local, a value bound via
//! `KERNEL.scope(...)` is visible only for the duration of that future, and
//! is not implicitly inherited by a *new* top-level `tokio::spawn` — so
//! [`scope`] re-establishes the binding explicitly around every event task
//! the kernel spawns, capturing and restoring it across the hop.

use des_core::SimError;
use std::future::Future;
use std::sync::Arc;

use crate::kernel::Kernel;

tokio::task_local! {
    static KERNEL: Arc<Kernel>;
}

/// Bind `kernel` as the ambient kernel for the duration of `body`.
///
/// This is what [`crate::kernel::Kernel::run_loop`] wraps itself in before
/// entering the event loop, and what every spawned event task is re-scoped
/// into so transformed user code can reach the scheduler without an
/// explicit context argument.
pub async fn scope<F>(kernel: Arc<Kernel>, body: F) -> F::Output
where
    F: Future,
{
    KERNEL.scope(kernel, body).await
}

/// Establish `kernel` as ambient for the current task. Intended for
/// top-level call sites (tests, a `main`) that aren't already inside a
/// kernel-scoped task; prefer [`scope`] when spawning a new task from
/// within one.
pub fn set_controller(kernel: Arc<Kernel>) -> impl Future<Output = ()> {
    KERNEL.scope(kernel, async {})
}

/// Fetch the ambient kernel bound to the current task.
///
/// Returns [`SimError::Invariant`] if no kernel is bound — calling a
/// kernel-ambient operation (`post_event`, `sleep`, ...) outside of any
/// `run_loop`/`scope` is a programmer error.
pub fn get_controller() -> Result<Arc<Kernel>, SimError> {
    KERNEL
        .try_with(Arc::clone)
        .map_err(|_| SimError::Invariant("no ambient kernel bound on this task".to_string()))
}

/// True if an ambient kernel is bound on the current task.
pub fn has_controller() -> bool {
    KERNEL.try_with(|_| ()).is_ok()
}
