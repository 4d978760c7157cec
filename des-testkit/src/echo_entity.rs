//! `EchoEntity` — returns its first argument as its result, and counts
//! how many times it has been invoked. The simplest possible entity that
//! still exercises the full `invoke`/`signature` contract and both
//! dispatch kinds (fire-and-forget via `post_event`, continuing via
//! `post_continuing`).

use async_trait::async_trait;
use des_core::{EntityDispatch, EventError, Value};
use std::sync::atomic::{AtomicU64, Ordering};

/// An entity whose single method (ordinal `0`, `"echo(x)"`) returns `x`
/// unchanged. Used for exercising scheduling, blocking return values, and
/// the spectrum map without any interesting entity-side logic to get in
/// the way.
#[derive(Default)]
pub struct EchoEntity {
    invocations: AtomicU64,
}

impl EchoEntity {
    /// A fresh echo entity with a zeroed invocation counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times `invoke` has run so far.
    pub fn invocation_count(&self) -> u64 {
        self.invocations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EntityDispatch for EchoEntity {
    async fn invoke(&self, ordinal: u32, args: &[Value]) -> Result<Value, EventError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        match ordinal {
            0 => Ok(args.first().cloned().unwrap_or(Value::Null)),
            other => Err(EventError::msg(format!(
                "EchoEntity has no method at ordinal {other}"
            ))),
        }
    }

    fn signature(&self, ordinal: u32) -> String {
        match ordinal {
            0 => "Echo.echo(x)".to_string(),
            other => format!("<unknown:{other}>"),
        }
    }
}
