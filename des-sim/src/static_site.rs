//! `run_static`'s adapter: lets a free function — not a method
//! on an entity class — be scheduled as an event.
//!
//! The entity-dispatch contract only knows how to invoke
//! ordinals on an `EntityDispatch`; a free function has neither an entity
//! nor an ordinal table. `StaticSite` closes that gap the same way a
//! one-method adapter closes it anywhere else in this codebase's
//! dependency injection style: wrap the function in a struct that *is*
//! a trivial single-ordinal `EntityDispatch`, boxing the future since
//! `dyn Fn` can't return an unboxed `async fn`'s opaque type.

use async_trait::async_trait;
use des_core::{EntityDispatch, EventError, Value};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

type BoxedInvoke =
    Arc<dyn Fn(Vec<Value>) -> Pin<Box<dyn Future<Output = Result<Value, EventError>> + Send>> + Send + Sync>;

/// A free function wrapped so [`crate::prelude::run_static`] can post it
/// to the kernel like any other entity method. Ordinal `0` is always the
/// wrapped function; `StaticSite` exists precisely so user code posting a
/// free function never has to think about ordinals at all.
#[derive(Clone)]
pub struct StaticSite {
    label: String,
    func: BoxedInvoke,
}

impl StaticSite {
    /// Wrap `func` as a schedulable site labeled `label` (used for
    /// `signature()`/spectrum/logging, not for dispatch).
    pub fn new<F, Fut>(label: impl Into<String>, func: F) -> Self
    where
        F: Fn(Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, EventError>> + Send + 'static,
    {
        Self {
            label: label.into(),
            func: Arc::new(move |args| Box::pin(func(args))),
        }
    }
}

#[async_trait]
impl EntityDispatch for StaticSite {
    async fn invoke(&self, _ordinal: u32, args: &[Value]) -> Result<Value, EventError> {
        (self.func)(args.to_vec()).await
    }

    fn signature(&self, _ordinal: u32) -> String {
        format!("{}()", self.label)
    }
}
