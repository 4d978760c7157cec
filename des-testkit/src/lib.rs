//! # des-testkit — fixtures for the discrete-event kernel
//!
//! In-memory, minimal [`des_core::EntityDispatch`] implementations, behind
//! no feature flag (unlike a `test-utils`-gated crate — this crate's only
//! purpose *is* fixtures, so there's nothing else to gate them against).
//! These exist to prove the kernel's traits are usable with hand-written
//! dispatch tables — no codegen required — and to give the kernel's own
//! integration tests, and downstream users, one shared starting point
//! instead of each reinventing a trivial entity.

#![deny(missing_docs)]

mod echo_entity;
mod kernel_builder;
mod recorder_entity;

pub use echo_entity::EchoEntity;
pub use kernel_builder::test_kernel;
pub use recorder_entity::{RecorderEntity, RecorderLog};
