//! A one-line kernel builder for tests, mirroring the convenience a
//! one-shot local-orchestrator constructor gives orchestrator tests.

use des_kernel::{Kernel, KernelConfig};
use std::sync::Arc;

/// A fresh kernel with default configuration (spectrum tracking on,
/// everything else off), clock at [`des_core::LogicalTime::ZERO`].
pub fn test_kernel() -> Arc<Kernel> {
    Kernel::new(KernelConfig::new())
}
