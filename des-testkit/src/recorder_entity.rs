//! `RecorderEntity` — sleeps, then appends an entry to a shared log.
//!
//! Exists to exercise the kernel's suspension protocol (`sleep`) from
//! inside a fixture entity without every downstream crate re-deriving the
//! same "sleep then record" shape recurring scenarios lean on (recursive
//! self-calls, same-instant FIFO). Reads the ambient kernel the way
//! transformed user code would, rather than taking a `Kernel` reference
//! directly — this fixture *is* a stand-in for codegen'd user code, not
//! kernel-internal machinery.

use async_trait::async_trait;
use des_core::{EntityDispatch, EventError, LogicalTime, Value};
use std::sync::Arc;
use tokio::sync::Mutex;

/// One entry appended by a [`RecorderEntity`]: the logical time it ran at
/// and the note it was invoked with.
pub type RecorderLog = Arc<Mutex<Vec<(LogicalTime, String)>>>;

/// An entity whose single method (ordinal `0`, `"record(note)"`) sleeps
/// for a fixed delay, then appends `(current_time, note)` to a shared log.
pub struct RecorderEntity {
    delay: i64,
    log: RecorderLog,
}

impl RecorderEntity {
    /// Create a recorder that sleeps `delay` logical units before
    /// appending to `log`.
    pub fn new(delay: i64, log: RecorderLog) -> Self {
        Self { delay, log }
    }

    /// A fresh, empty log suitable for handing to one or more recorders.
    pub fn new_log() -> RecorderLog {
        Arc::new(Mutex::new(Vec::new()))
    }
}

#[async_trait]
impl EntityDispatch for RecorderEntity {
    async fn invoke(&self, ordinal: u32, args: &[Value]) -> Result<Value, EventError> {
        if ordinal != 0 {
            return Err(EventError::msg(format!(
                "RecorderEntity has no method at ordinal {ordinal}"
            )));
        }
        let note = args
            .first()
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let kernel = des_kernel::ambient::get_controller()
            .map_err(|e| EventError::msg(e.to_string()))?;
        kernel
            .sleep(self.delay)
            .await
            .map_err(|e| EventError::msg(e.to_string()))?;
        let now = kernel.current_time().await;
        self.log.lock().await.push((now, note.clone()));
        Ok(Value::String(note))
    }

    fn signature(&self, ordinal: u32) -> String {
        match ordinal {
            0 => "Recorder.record(note)".to_string(),
            other => format!("<unknown:{other}>"),
        }
    }
}
