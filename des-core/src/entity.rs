//! The entity dispatch contract.
//!
//! This is the *only* surface the kernel requires of user code. A real
//! deployment pairs this trait with an external bytecode/source transform
//! that assigns dense, stable ordinals per class and generates the
//! `invoke`/`signature` bodies; that transform is out of scope here.
//! Hand-written dispatch tables covering the simple cases are exercised
//! by `des-testkit`.

use crate::error::EventError;
use crate::value::Value;
use async_trait::async_trait;

/// How a method ordinal was categorized at codegen time.
///
/// The kernel only distinguishes "fire and forget" from "continuing"; it
/// does not need to know *why* a method is continuing (explicit
/// `blocking` marker vs. implicit because it returns a value), so this
/// enum exists for documentation/debug purposes — `EntityDispatch` itself
/// never needs to ask for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    /// Fire-and-forget: the caller's invocation returns immediately, a
    /// fresh event is scheduled at the current kernel time.
    VoidNonBlocking,
    /// Explicitly marked blocking regardless of return type.
    Blocking,
    /// Implicitly blocking because the method returns a value.
    ValueReturning,
}

impl MethodKind {
    /// Kinds 2 and 3 are handled identically by the kernel ("continuing").
    pub fn is_continuing(&self) -> bool {
        !matches!(self, MethodKind::VoidNonBlocking)
    }
}

/// Every entity class satisfies this contract so the kernel can schedule
/// and dispatch its methods as events without knowing anything about the
/// entity's internal state or the bodies of its methods.
///
/// Object-safe by construction (`Value` is a concrete type, not generic)
/// so the kernel holds entities as `Arc<dyn EntityDispatch>`.
#[async_trait]
pub trait EntityDispatch: Send + Sync {
    /// Execute the method at `ordinal` with the given arguments.
    ///
    /// Raising an error here is how user code signals a failed event body;
    /// the kernel wraps it into [`crate::error::SimError::Event`] with
    /// dispatch-time context before propagating it to a blocked caller or
    /// the event loop.
    async fn invoke(&self, ordinal: u32, args: &[Value]) -> Result<Value, EventError>;

    /// A human-readable signature for the method at `ordinal`, used for
    /// logs, the spectrum map, and trace printing. Ordinals are dense and
    /// stable for one build of the program; `signature` should
    /// never panic even for an ordinal the entity doesn't recognize —
    /// return a placeholder like `"<unknown:N>"` instead, since the kernel
    /// uses this for best-effort diagnostics, not dispatch.
    fn signature(&self, ordinal: u32) -> String;
}
