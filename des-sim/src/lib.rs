//! # des-sim — public facade for the discrete-event simulation kernel
//!
//! Single import surface for code that targets the kernel, following the
//! usual umbrella-crate pattern: re-export the component crates, then
//! offer a `prelude` of ambient free functions that read the task-local
//! kernel binding established by `des_kernel::ambient` instead of
//! threading a context argument through every call — exactly what
//! transformed entity code targets.
//!
//! This workspace has no optional providers to gate behind feature flags,
//! so every component crate is re-exported unconditionally.

#![deny(missing_docs)]

mod static_site;

pub use des_channel;
pub use des_channel::Channel;
pub use des_core;
pub use des_kernel;
pub use des_kernel::{Kernel, KernelConfig, RunSummary};
pub use static_site::StaticSite;

/// Ambient free functions forming the crate's public API surface.
///
/// Every function here reads (or establishes) the kernel bound to the
/// current task via [`des_kernel::ambient`]; none of them take a `Kernel`
/// argument, because the whole point of the ambient binding is that
/// transformed user code never needs one.
pub mod prelude {
    use std::sync::Arc;

    use des_core::{EventId, LogicalTime, SimError, Value};
    use des_kernel::{ambient, Kernel};

    use crate::static_site::StaticSite;

    /// Suspend the currently executing event for `dt` logical units, then
    /// resume.
    pub async fn sleep(dt: i64) -> Result<(), SimError> {
        ambient::get_controller()?.sleep(dt).await
    }

    /// Identical to [`sleep`]; kept as a distinct name for call-site
    /// fidelity with code that wants to spell out a blocking wait (see
    /// `des_kernel::kernel`'s module doc comment for why the two collapse
    /// to one implementation in an `async fn`-based kernel).
    pub async fn blocking_sleep(dt: i64) -> Result<(), SimError> {
        ambient::get_controller()?.blocking_sleep(dt).await
    }

    /// The ambient kernel's current logical time.
    pub async fn current_time() -> Result<LogicalTime, SimError> {
        Ok(ambient::get_controller()?.current_time().await)
    }

    /// Establish `kernel` as the ambient kernel for the current task
    ///.
    pub async fn set_controller(kernel: Arc<Kernel>) {
        ambient::set_controller(kernel).await
    }

    /// Fetch the ambient kernel bound to the current task.
    pub fn get_controller() -> Result<Arc<Kernel>, SimError> {
        ambient::get_controller()
    }

    /// A fresh rendezvous channel bound to the ambient kernel.
    pub fn create_channel<T: Send + 'static>() -> Result<des_channel::Channel<T>, SimError> {
        Ok(des_channel::Channel::new(ambient::get_controller()?))
    }

    /// Request cooperative shutdown as soon as possible.
    pub async fn end_simulation() -> Result<(), SimError> {
        ambient::get_controller()?.end_simulation().await;
        Ok(())
    }

    /// Request cooperative shutdown no later than `time`.
    pub async fn end_simulation_at(time: LogicalTime) -> Result<(), SimError> {
        ambient::get_controller()?.end_at(time).await;
        Ok(())
    }

    /// Schedule `site` as a fire-and-forget event at the current time
    ///.
    pub async fn run_static(site: StaticSite, args: Vec<Value>) -> Result<EventId, SimError> {
        let kernel = ambient::get_controller()?;
        kernel.post_event(Arc::new(site), 0, args).await
    }

    /// Schedule `site` at `time`.
    pub async fn run_static_at(
        time: LogicalTime,
        site: StaticSite,
        args: Vec<Value>,
    ) -> Result<EventId, SimError> {
        let kernel = ambient::get_controller()?;
        kernel.post_event_at(time, Arc::new(site), 0, args).await
    }
}
